//! An incremental, resumable, in-place XML 1.0 pull parser.
//!
//! [`create_parser`]/[`create_parser_owned`] build an [`XmlParser`] over a
//! byte buffer whose encoding (UTF-8, UTF-16LE, UTF-16BE) is detected from
//! its BOM. [`XmlParser::parse_next`] advances the parser by exactly one
//! [`TokenKind`]; when the buffer runs out mid-construct it returns
//! `TokenKind::IncompleteDocument` instead of an error, and the caller can
//! feed more bytes with [`XmlParser::append_data`] and call `parse_next`
//! again. For recovery across a buffer compaction deep inside a partially
//! parsed element, [`XmlParser::set_savepoint_at_current_tag`] and
//! [`XmlParser::restore_to_savepoint`] let the caller rewind to the start
//! of the current tag and re-enter it once more bytes have arrived.
//!
//! ```
//! use xylopull::{create_parser, TokenKind};
//!
//! let mut parser = create_parser(b"<a><b>hi</b></a>");
//! assert_eq!(parser.parse_next(), TokenKind::OpenDocument);
//! assert_eq!(parser.parse_next(), TokenKind::OpenTag);
//! assert_eq!(parser.current_tag_name(), b"a");
//! assert_eq!(parser.parse_next(), TokenKind::OpenTag);
//! assert_eq!(parser.current_tag_name(), b"b");
//! assert_eq!(parser.parse_next(), TokenKind::Text);
//! assert_eq!(parser.current_value(), b"hi");
//! assert_eq!(parser.parse_next(), TokenKind::CloseTag);
//! assert_eq!(parser.parse_next(), TokenKind::CloseTag);
//! assert_eq!(parser.parse_next(), TokenKind::CloseDocument);
//! ```

mod codec;
pub mod error;
mod name;
mod parser;
mod stack;
mod text;
mod token;

pub use codec::{ByteOrder, CodePoint, Encoding, ParseOutcome};
pub use error::{Error, Result};
pub use parser::{create_parser, create_parser_owned, XmlParser};
pub use token::TokenKind;
