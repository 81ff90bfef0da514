//! Collect the text of every `<tag2>` element, feeding the document one
//! chunk at a time to show the incremental resume protocol in practice.

use xylopull::{create_parser_owned, TokenKind};

fn main() {
    let xml = b"<tag1>text1</tag1><tag1>text2</tag1>\
                <tag1>text3</tag1><tag1><tag2>text4</tag2></tag1>";

    // Pretend the bytes arrive in three chunks from a socket.
    let chunks: Vec<&[u8]> = vec![&xml[..20], &xml[20..60], &xml[60..]];
    let mut chunks = chunks.into_iter();

    let mut parser = create_parser_owned(chunks.next().unwrap().to_vec());
    let mut txt = Vec::new();
    let mut in_tag2 = false;

    loop {
        match parser.parse_next() {
            TokenKind::OpenTag if parser.current_tag_name() == b"tag2" => {
                in_tag2 = true;
            }
            TokenKind::Text if in_tag2 => {
                txt.push(parser.current_value().to_vec());
                println!("{:?}", txt);
            }
            TokenKind::CloseTag if parser.current_tag_name() == b"tag2" => {
                in_tag2 = false;
            }
            TokenKind::CloseDocument => break,
            TokenKind::IncompleteDocument => match chunks.next() {
                Some(more) => parser.append_data(more),
                None => panic!("ran out of input while still incomplete"),
            },
            TokenKind::Error => {
                panic!("malformed document: {:?}", parser.current_error());
            }
            _ => (),
        }
    }
}
