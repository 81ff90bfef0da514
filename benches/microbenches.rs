use criterion::{self, criterion_group, criterion_main, Criterion};
use xylopull::{create_parser, create_parser_owned, TokenKind};

static SAMPLE: &[u8] = include_bytes!("sample.xml");

/// Benchmarks a full `parse_next` loop over a document that never hits
/// `IncompleteDocument`, the common case once a document has arrived in
/// full before parsing starts.
fn parse_next_loop(c: &mut Criterion) {
    c.bench_function("parse_next_loop", |b| {
        b.iter(|| {
            let mut p = create_parser(SAMPLE);
            let mut count = criterion::black_box(0);
            loop {
                match p.parse_next() {
                    TokenKind::OpenTag => count += 1,
                    TokenKind::CloseDocument => break,
                    TokenKind::Error => panic!("malformed sample document"),
                    _ => (),
                }
            }
            assert_eq!(count, 9, "open-tag count in benches/sample.xml");
        })
    });
}

/// Benchmarks the incremental path: the same document fed one byte at a
/// time, so every construct is parsed through at least one
/// `IncompleteDocument`/`append_data` round trip before it completes.
fn byte_at_a_time(c: &mut Criterion) {
    c.bench_function("byte_at_a_time", |b| {
        b.iter(|| {
            let mut p = create_parser_owned(Vec::new());
            let mut fed = 0usize;
            loop {
                match p.parse_next() {
                    TokenKind::IncompleteDocument => {
                        p.append_data(&SAMPLE[fed..fed + 1]);
                        fed += 1;
                    }
                    TokenKind::CloseDocument => break,
                    TokenKind::Error => panic!("malformed sample document"),
                    _ => (),
                }
            }
        })
    });
}

criterion_group!(benches, parse_next_loop, byte_at_a_time);
criterion_main!(benches);
