//! Error types returned while decoding names, values and structure.
//!
//! `TruncatedInput` from the taxonomy this crate implements is deliberately
//! absent here: running out of bytes mid-construct is not an error, it is
//! surfaced as [`TokenKind::IncompleteDocument`](crate::TokenKind::IncompleteDocument)
//! and resolved through [`XmlParser::append_data`](crate::XmlParser::append_data).

use std::fmt;

/// The kind of malformed-input condition that turned the parser terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A byte sequence could not be decoded under the active encoding
    /// (overlong UTF-8, an unpaired UTF-16 surrogate, a stray continuation
    /// byte, ...).
    MalformedEncoding,
    /// A byte was encountered where the grammar allows none: `<` inside an
    /// attribute value, a missing `=` or quote, an illegal Name character.
    UnexpectedByte,
    /// A closing tag's name did not match the name on top of the parse
    /// stack.
    TagMismatch {
        expected: String,
        found: String,
    },
    /// The `<?xml ... ?>` declaration named an `encoding` the active codec
    /// does not recognise.
    UnsupportedEncoding(String),
    /// The `<?xml ... ?>` declaration's `version` did not start with `1.`.
    BadVersion(String),
    /// An entity or character reference was malformed: an unknown named
    /// entity, an empty `&#;`, an out-of-range numeric reference, or a
    /// numeric reference with too many digits.
    BadEntity,
    /// A decoded character violated the XML 1.0 `Char` production.
    OutOfRangeChar,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedEncoding => write!(f, "malformed byte sequence for the active encoding"),
            Error::UnexpectedByte => write!(f, "unexpected byte in input"),
            Error::TagMismatch { expected, found } => {
                write!(f, "closing tag `{}` does not match open tag `{}`", found, expected)
            }
            Error::UnsupportedEncoding(name) => write!(f, "unsupported encoding `{}`", name),
            Error::BadVersion(version) => write!(f, "unsupported XML version `{}`", version),
            Error::BadEntity => write!(f, "malformed entity or character reference"),
            Error::OutOfRangeChar => write!(f, "character outside the XML 1.0 Char production"),
        }
    }
}

impl std::error::Error for Error {}

/// A specialized [`Result`](std::result::Result) for fallible helper
/// operations inside the crate.
pub type Result<T> = std::result::Result<T, Error>;
