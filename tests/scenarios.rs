use pretty_assertions::assert_eq;
use xylopull::{create_parser, create_parser_owned, TokenKind};

#[test]
fn s1_nested_elements_with_text() {
    let xml = b"<rootTag><mandatoryMember>10</mandatoryMember><optionalMember>23</optionalMember></rootTag>";
    let mut p = create_parser(xml);

    assert_eq!(p.parse_next(), TokenKind::OpenDocument);

    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"rootTag");

    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"mandatoryMember");

    assert_eq!(p.parse_next(), TokenKind::Text);
    assert_eq!(p.current_value(), b"10");

    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.current_tag_name(), b"mandatoryMember");

    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"optionalMember");

    assert_eq!(p.parse_next(), TokenKind::Text);
    assert_eq!(p.current_value(), b"23");

    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.current_tag_name(), b"optionalMember");

    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.current_tag_name(), b"rootTag");

    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn s2_empty_element_with_attribute() {
    let mut p = create_parser(br#"<char value="a"/>"#);
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"char");
    assert_eq!(p.parse_next(), TokenKind::Attribute);
    assert_eq!(p.current_attr_name(), b"value");
    assert_eq!(p.current_value(), b"a");
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.current_tag_name(), b"char");
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn s3_predefined_entities() {
    let mut p = create_parser(b"<e>&lt;b&gt;&quot;X&amp;Y&quot;&lt;/b&gt;</e>");
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.parse_next(), TokenKind::Text);
    assert_eq!(p.current_value(), br#"<b>"X&Y"</b>"#);
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn s4_numeric_character_references() {
    let mut p = create_parser(b"<e>&#65;&#x42;&#67;</e>");
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.parse_next(), TokenKind::Text);
    assert_eq!(p.current_value(), b"ABC");
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn s5_incremental_resume_with_savepoint() {
    let chunk1 = b"<root><inner a".to_vec();
    let chunk2 = b"tt=\"1\"><v>1</v></inner><inner att=\"1\"><v>1</v></inner></root>".to_vec();

    let mut full = chunk1.clone();
    full.extend_from_slice(&chunk2);
    let mut one_shot = create_parser_owned(full);
    let mut expected = Vec::new();
    loop {
        let tok = one_shot.parse_next();
        expected.push(tok);
        if tok == TokenKind::CloseDocument || tok == TokenKind::Error {
            break;
        }
    }

    // A caller using the savepoint protocol must treat the `OpenTag` that
    // triggered the savepoint as tentative: `restore_to_savepoint`
    // re-dispatches that exact tag from scratch, so the log of observed
    // tokens rewinds to just before it rather than recording it twice.
    let mut incremental = create_parser_owned(chunk1);
    let mut actual = Vec::new();
    let mut savepoint_mark: Option<usize> = None;
    let mut tok = incremental.parse_next();
    loop {
        match tok {
            TokenKind::IncompleteDocument => {
                incremental.append_data(&chunk2);
                if let Some(mark) = savepoint_mark.take() {
                    actual.truncate(mark);
                }
                assert!(incremental.restore_to_savepoint());
                tok = incremental.current_token_kind();
                continue;
            }
            TokenKind::CloseDocument | TokenKind::Error => {
                actual.push(tok);
                break;
            }
            TokenKind::OpenTag => {
                savepoint_mark = Some(actual.len());
                incremental.set_savepoint_at_current_tag();
                actual.push(tok);
            }
            other => actual.push(other),
        }
        tok = incremental.parse_next();
    }

    assert_eq!(actual, expected);
}

#[test]
fn s6_tag_mismatch_is_error() {
    let mut p = create_parser(b"<a></b>");
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.parse_next(), TokenKind::Error);
    // Error is sticky.
    assert_eq!(p.parse_next(), TokenKind::Error);
    assert_eq!(p.parse_next(), TokenKind::Error);
}

#[test]
fn empty_element_emits_no_attribute_or_text_tokens() {
    let mut p = create_parser(b"<x/>");
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn mixed_whitespace_between_siblings_is_preserved_text() {
    let mut p = create_parser(b"<x>  <y/>  </x>");
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"x");
    assert_eq!(p.parse_next(), TokenKind::Text);
    assert_eq!(p.current_value(), b"  ");
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"y");
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::Text);
    assert_eq!(p.current_value(), b"  ");
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.current_tag_name(), b"x");
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn byte_by_byte_feed_reproduces_one_shot_token_stream() {
    let xml = b"<root a=\"1\"><child>text &amp; more</child></root>".to_vec();

    let mut one_shot = create_parser(&xml);
    let mut expected = Vec::new();
    loop {
        let tok = one_shot.parse_next();
        expected.push(tok);
        if tok.is_terminal() {
            break;
        }
    }

    // Feed one byte at a time, retrying (no savepoint needed since no
    // compaction happens without `append_data`'s explicit call removing
    // needed bytes) until a non-incomplete token is produced.
    let mut incremental = create_parser_owned(Vec::new());
    let mut fed = 0usize;
    let mut actual = Vec::new();
    loop {
        let tok = incremental.parse_next();
        match tok {
            TokenKind::IncompleteDocument => {
                if fed >= xml.len() {
                    panic!("ran out of input while still incomplete");
                }
                incremental.append_data(&xml[fed..fed + 1]);
                fed += 1;
            }
            other => {
                actual.push(other);
                if other.is_terminal() {
                    break;
                }
            }
        }
    }

    assert_eq!(actual, expected);
}

#[test]
fn prolog_with_supported_encoding_name_is_accepted() {
    let mut p = create_parser(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>");
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn prolog_with_bad_version_is_error() {
    let mut p = create_parser(b"<?xml version=\"2.0\"?><a/>");
    assert_eq!(p.parse_next(), TokenKind::Error);
}

#[test]
fn prolog_with_unsupported_encoding_is_error() {
    let mut p = create_parser(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a/>");
    assert_eq!(p.parse_next(), TokenKind::Error);
}

#[test]
fn prolog_without_version_attribute_is_accepted() {
    let mut p = create_parser(b"<?xml encoding=\"UTF-8\"?><a/>");
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn utf16le_bom_document_round_trips_names_and_values_as_utf8() {
    let xml_body = "<root a=\"1\"><child>hi</child></root>";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in xml_body.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let mut p = create_parser(&bytes);
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"root");
    assert_eq!(p.parse_next(), TokenKind::Attribute);
    assert_eq!(p.current_attr_name(), b"a");
    assert_eq!(p.current_value(), b"1");
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"child");
    assert_eq!(p.parse_next(), TokenKind::Text);
    assert_eq!(p.current_value(), b"hi");
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn utf16be_bom_document_round_trips_names_and_values_as_utf8() {
    let xml_body = "<root a=\"1\"><child>hi</child></root>";
    let mut bytes = vec![0xFE, 0xFF];
    for unit in xml_body.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    let mut p = create_parser(&bytes);
    assert_eq!(p.parse_next(), TokenKind::OpenDocument);
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"root");
    assert_eq!(p.parse_next(), TokenKind::Attribute);
    assert_eq!(p.current_attr_name(), b"a");
    assert_eq!(p.current_value(), b"1");
    assert_eq!(p.parse_next(), TokenKind::OpenTag);
    assert_eq!(p.current_tag_name(), b"child");
    assert_eq!(p.parse_next(), TokenKind::Text);
    assert_eq!(p.current_value(), b"hi");
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseTag);
    assert_eq!(p.parse_next(), TokenKind::CloseDocument);
}

#[test]
fn extract_xml_data_recovers_the_tail() {
    let p = create_parser(b"<a/>tail-bytes-not-part-of-the-document");
    let recovered = p.extract_xml_data();
    assert!(recovered.starts_with(b"<a/>"));
}
