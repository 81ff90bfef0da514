//! The in-place text-decoding/entity-expansion engine.
//!
//! Consumes the body of an attribute value or a text node, expanding the
//! five predefined entity references and numeric character references,
//! validating every resulting code point against the XML 1.0 `Char`
//! production, and writing decoded UTF-8 bytes into a caller-owned output
//! buffer.

use crate::codec::{CodePoint, Encoding, ParseOutcome};
use crate::error::Error;
use crate::name::is_valid_xml_char;

/// Selects the termination rule applied while decoding text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextType {
    /// Character data: terminates before (not consuming) a `<`.
    CharData,
    /// A single-quoted attribute value: terminates at (consuming) `'`;
    /// a bare `<` inside is an error.
    AttValueApos,
    /// A double-quoted attribute value: terminates at (consuming) `"`;
    /// a bare `<` inside is an error.
    AttValueQuote,
    /// Consumes to end-of-buffer. Exists for unit testing only.
    Plain,
}

/// Terminal outcome of a `decode_text` call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextOutcome {
    /// The terminator was found; `new_cursor` is positioned just past it
    /// (or, for `CharData`, just before the `<`).
    AtEnd { new_cursor: usize },
    /// The buffer ran out before a terminator was found. `new_cursor`
    /// marks the last position decoding can safely resume from (i.e. the
    /// start of the incomplete construct), so a caller that appends more
    /// bytes can call `decode_text` again from there.
    IncompleteText { resume_cursor: usize },
    /// Malformed input: raw `<` inside an attribute value, an unterminated
    /// or unrecognised entity, an out-of-range character, ...
    Error(Error),
}

/// Decode text starting at `buf[cursor..end]` under `encoding`, appending
/// UTF-8 bytes to `out` (which is cleared first). Returns the terminal
/// outcome; on `AtEnd`, `out` holds exactly the decoded value.
pub fn decode_text(
    buf: &[u8],
    cursor: usize,
    end: usize,
    encoding: Encoding,
    text_type: TextType,
    out: &mut Vec<u8>,
) -> TextOutcome {
    out.clear();
    let mut pos = cursor;

    loop {
        if pos >= end {
            return TextOutcome::IncompleteText { resume_cursor: cursor };
        }
        let remaining = &buf[pos..end];

        let (cp, outcome) = encoding.decode_next(remaining);
        let consumed = match outcome {
            ParseOutcome::Ok(n) => n,
            ParseOutcome::IncompleteCharacter => {
                return TextOutcome::IncompleteText { resume_cursor: cursor }
            }
            ParseOutcome::InvalidCharacter => {
                return TextOutcome::Error(Error::MalformedEncoding)
            }
        };

        match (text_type, cp) {
            // Stops before `<` without consuming it, so the caller's next
            // token starts from the same position.
            (TextType::CharData, '<') => return TextOutcome::AtEnd { new_cursor: pos },
            (TextType::AttValueApos, '\'') => return TextOutcome::AtEnd { new_cursor: pos + consumed },
            (TextType::AttValueQuote, '"') => return TextOutcome::AtEnd { new_cursor: pos + consumed },
            (TextType::AttValueApos, '<') | (TextType::AttValueQuote, '<') => {
                return TextOutcome::Error(Error::UnexpectedByte)
            }
            _ => {}
        }

        if cp == '&' {
            pos += consumed;
            match decode_entity(buf, pos, end, encoding) {
                Ok((decoded, new_pos)) => {
                    if !is_valid_xml_char(decoded) {
                        return TextOutcome::Error(Error::OutOfRangeChar);
                    }
                    push_char(out, decoded);
                    pos = new_pos;
                    continue;
                }
                Err(EntityError::Incomplete) => {
                    return TextOutcome::IncompleteText { resume_cursor: cursor }
                }
                Err(EntityError::Malformed) => return TextOutcome::Error(Error::BadEntity),
            }
        }

        if !is_valid_xml_char(cp) {
            return TextOutcome::Error(Error::OutOfRangeChar);
        }
        push_char(out, cp);
        pos += consumed;

        if text_type == TextType::Plain && pos >= end {
            return TextOutcome::AtEnd { new_cursor: pos };
        }
    }
}

fn push_char(out: &mut Vec<u8>, cp: CodePoint) {
    let mut tmp = [0u8; 4];
    let s = cp.encode_utf8(&mut tmp);
    out.extend_from_slice(s.as_bytes());
}

enum EntityError {
    Incomplete,
    Malformed,
}

/// Decode the body of an entity reference starting just after the `&`.
/// Returns the decoded code point and the cursor just past the
/// terminating `;`.
fn decode_entity(
    buf: &[u8],
    pos: usize,
    end: usize,
    encoding: Encoding,
) -> Result<(CodePoint, usize), EntityError> {
    let remaining = &buf[pos..end];
    if remaining.is_empty() {
        return Err(EntityError::Incomplete);
    }

    if remaining[0] == b'#' {
        return decode_numeric_reference(buf, pos + 1, end);
    }

    // Named entity: scan ASCII letters up to `;`.
    let mut i = 0;
    while pos + i < end {
        match buf[pos + i] {
            b';' => {
                let name = &remaining[..i];
                let decoded = match name {
                    b"amp" => '&',
                    b"apos" => '\'',
                    b"gt" => '>',
                    b"lt" => '<',
                    b"quot" => '"',
                    _ => return Err(EntityError::Malformed),
                };
                return Ok((decoded, pos + i + 1));
            }
            b'a'..=b'z' => i += 1,
            _ => return Err(EntityError::Malformed),
        }
    }
    let _ = encoding; // named-entity scanning is ASCII-only regardless of codec
    Err(EntityError::Incomplete)
}

fn decode_numeric_reference(
    buf: &[u8],
    pos: usize,
    end: usize,
) -> Result<(CodePoint, usize), EntityError> {
    let hex = buf.get(pos) == Some(&b'x');
    let digits_start = if hex { pos + 1 } else { pos };
    let max_digits = if hex { 6 } else { 7 };

    let mut i = digits_start;
    let mut value: u32 = 0;
    let mut digit_count = 0;

    loop {
        if i >= end {
            return Err(EntityError::Incomplete);
        }
        let b = buf[i];
        if b == b';' {
            break;
        }
        let digit = if hex {
            match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(EntityError::Malformed),
            }
        } else {
            match b {
                b'0'..=b'9' => b - b'0',
                _ => return Err(EntityError::Malformed),
            }
        };
        digit_count += 1;
        if digit_count > max_digits {
            return Err(EntityError::Malformed);
        }
        value = value * if hex { 16 } else { 10 } + digit as u32;
        i += 1;
    }

    if digit_count == 0 {
        return Err(EntityError::Malformed);
    }

    match char::from_u32(value) {
        Some(cp) => Ok((cp, i + 1)),
        None => Err(EntityError::Malformed),
    }
}
