//! Unicode codec layer: UTF-8, UTF-16LE, UTF-16BE.
//!
//! Each codec exposes the same four pure decode/encode/BOM/name-check
//! operations. Dispatch between the three concrete codecs is a 3-arm match
//! on [`Encoding`] rather than a generic parameter: the match is a handful
//! of branches inlined at every call site, so it costs nothing a
//! monomorphised generic wouldn't also cost in code size.

/// A 32-bit scalar Unicode value. `char` already enforces exactly the
/// legal range for a code point
/// (`U+0000..=U+D7FF` and `U+E000..=U+10FFFF`), so no wrapper is introduced.
pub type CodePoint = char;

/// Byte order selector for the UTF-16 codec family.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// Result of a single decode or encode attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Success; carries the number of bytes consumed/written (1..=4).
    Ok(usize),
    /// The sequence is a valid prefix of some encoded code point, but more
    /// bytes are needed to complete it. Not an error: drives the resume
    /// mechanism in `parser.rs`.
    IncompleteCharacter,
    /// The sequence (or code point, for `encode_one`) can never be valid
    /// under this codec.
    InvalidCharacter,
}

impl ParseOutcome {
    pub fn is_ok(self) -> bool {
        matches!(self, ParseOutcome::Ok(_))
    }

    pub fn len(self) -> Option<usize> {
        match self {
            ParseOutcome::Ok(n) => Some(n),
            _ => None,
        }
    }
}

/// The active codec for a parser instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16(ByteOrder),
}

impl Encoding {
    /// Decode one code point starting at `bytes[0]`.
    pub fn decode_next(self, bytes: &[u8]) -> (CodePoint, ParseOutcome) {
        match self {
            Encoding::Utf8 => utf8::decode_next(bytes),
            Encoding::Utf16(order) => utf16::decode_next(bytes, order),
        }
    }

    /// Encode `cp` into `out`, returning the number of bytes written.
    pub fn encode_one(self, cp: CodePoint, out: &mut [u8]) -> ParseOutcome {
        match self {
            Encoding::Utf8 => utf8::encode_one(cp, out),
            Encoding::Utf16(order) => utf16::encode_one(cp, out, order),
        }
    }

    /// Grow `out` and encode `cp` at its end.
    pub fn append_to(self, out: &mut Vec<u8>, cp: CodePoint) -> ParseOutcome {
        let mut buf = [0u8; 4];
        let outcome = self.encode_one(cp, &mut buf);
        if let ParseOutcome::Ok(n) = outcome {
            out.extend_from_slice(&buf[..n]);
        }
        outcome
    }

    /// The byte width of this codec's BOM, if `bytes` starts with one.
    pub fn has_bom(self, bytes: &[u8]) -> bool {
        match self {
            Encoding::Utf8 => bytes.starts_with(&[0xEF, 0xBB, 0xBF]),
            Encoding::Utf16(ByteOrder::BigEndian) => bytes.starts_with(&[0xFE, 0xFF]),
            Encoding::Utf16(ByteOrder::LittleEndian) => bytes.starts_with(&[0xFF, 0xFE]),
        }
    }

    /// Width in bytes of this codec's BOM marker.
    pub fn bom_len(self) -> usize {
        match self {
            Encoding::Utf8 => 3,
            Encoding::Utf16(_) => 2,
        }
    }

    /// Case-sensitive match against this codec's canonical encoding name
    /// as it would appear in an `<?xml encoding="..." ?>` declaration.
    /// UTF-16LE and UTF-16BE both answer to plain "UTF-16" (byte order is
    /// determined by the BOM, not by the declared name).
    pub fn is_supported_encoding_name(self, name: &[u8]) -> bool {
        match self {
            Encoding::Utf8 => name == b"UTF-8",
            Encoding::Utf16(_) => name == b"UTF-16",
        }
    }

    /// Inspect the leading bytes of a stream and pick the codec + BOM skip
    /// length: a UTF-16BE BOM selects UTF-16BE, a UTF-16LE BOM selects
    /// UTF-16LE, a UTF-8 BOM selects UTF-8 (BOM skipped), otherwise UTF-8
    /// with no BOM to skip.
    pub fn detect(bytes: &[u8]) -> (Encoding, usize) {
        if Encoding::Utf16(ByteOrder::BigEndian).has_bom(bytes) {
            (Encoding::Utf16(ByteOrder::BigEndian), 2)
        } else if Encoding::Utf16(ByteOrder::LittleEndian).has_bom(bytes) {
            (Encoding::Utf16(ByteOrder::LittleEndian), 2)
        } else if Encoding::Utf8.has_bom(bytes) {
            (Encoding::Utf8, 3)
        } else {
            (Encoding::Utf8, 0)
        }
    }
}

/// Reject a decoded scalar outside `CodePoint`'s legal range (surrogates,
/// or out of Unicode's defined range) before handing it back to the
/// caller. Shared by both codec families.
fn scalar_from_u32(v: u32) -> Option<CodePoint> {
    char::from_u32(v)
}

pub mod utf8 {
    use super::*;

    pub fn decode_next(bytes: &[u8]) -> (CodePoint, ParseOutcome) {
        let b0 = match bytes.first() {
            Some(&b) => b,
            None => return ('\u{0}', ParseOutcome::IncompleteCharacter),
        };

        let (len, mut v, min) = if b0 < 0x80 {
            return (b0 as char, ParseOutcome::Ok(1));
        } else if b0 & 0xE0 == 0xC0 {
            (2, (b0 & 0x1F) as u32, 0x80)
        } else if b0 & 0xF0 == 0xE0 {
            (3, (b0 & 0x0F) as u32, 0x800)
        } else if b0 & 0xF8 == 0xF0 {
            (4, (b0 & 0x07) as u32, 0x10000)
        } else {
            return ('\u{0}', ParseOutcome::InvalidCharacter);
        };

        if bytes.len() < len {
            // Validate the continuation bytes we do have so a guaranteed
            // future mismatch is reported now rather than after more
            // bytes arrive.
            for &b in &bytes[1..] {
                if b & 0xC0 != 0x80 {
                    return ('\u{0}', ParseOutcome::InvalidCharacter);
                }
            }
            return ('\u{0}', ParseOutcome::IncompleteCharacter);
        }

        for &b in &bytes[1..len] {
            if b & 0xC0 != 0x80 {
                return ('\u{0}', ParseOutcome::InvalidCharacter);
            }
            v = (v << 6) | (b & 0x3F) as u32;
        }

        if v < min {
            return ('\u{0}', ParseOutcome::InvalidCharacter); // overlong
        }
        match scalar_from_u32(v) {
            Some(cp) => (cp, ParseOutcome::Ok(len)),
            None => ('\u{0}', ParseOutcome::InvalidCharacter), // surrogate or > U+10FFFF
        }
    }

    pub fn encode_one(cp: CodePoint, out: &mut [u8]) -> ParseOutcome {
        let mut tmp = [0u8; 4];
        let s = cp.encode_utf8(&mut tmp);
        let len = s.len();
        if out.len() < len {
            return ParseOutcome::IncompleteCharacter;
        }
        out[..len].copy_from_slice(s.as_bytes());
        ParseOutcome::Ok(len)
    }
}

pub mod utf16 {
    use super::*;

    fn read_u16(bytes: &[u8], order: ByteOrder) -> u16 {
        match order {
            ByteOrder::LittleEndian => u16::from_le_bytes([bytes[0], bytes[1]]),
            ByteOrder::BigEndian => u16::from_be_bytes([bytes[0], bytes[1]]),
        }
    }

    fn write_u16(out: &mut [u8], v: u16, order: ByteOrder) {
        let bytes = match order {
            ByteOrder::LittleEndian => v.to_le_bytes(),
            ByteOrder::BigEndian => v.to_be_bytes(),
        };
        out[0] = bytes[0];
        out[1] = bytes[1];
    }

    pub fn decode_next(bytes: &[u8], order: ByteOrder) -> (CodePoint, ParseOutcome) {
        if bytes.len() < 2 {
            return ('\u{0}', ParseOutcome::IncompleteCharacter);
        }
        let unit0 = read_u16(bytes, order);

        if (0xD800..=0xDBFF).contains(&unit0) {
            // High surrogate: must be followed by a low surrogate.
            if bytes.len() < 4 {
                return ('\u{0}', ParseOutcome::IncompleteCharacter);
            }
            let unit1 = read_u16(&bytes[2..], order);
            if !(0xDC00..=0xDFFF).contains(&unit1) {
                return ('\u{0}', ParseOutcome::InvalidCharacter);
            }
            let v = 0x10000
                + ((unit0 as u32 - 0xD800) << 10)
                + (unit1 as u32 - 0xDC00);
            return match scalar_from_u32(v) {
                Some(cp) => (cp, ParseOutcome::Ok(4)),
                None => ('\u{0}', ParseOutcome::InvalidCharacter),
            };
        }
        if (0xDC00..=0xDFFF).contains(&unit0) {
            // Lone low surrogate.
            return ('\u{0}', ParseOutcome::InvalidCharacter);
        }
        // unit0 is outside both surrogate ranges, so it is always a valid
        // BMP scalar value.
        match scalar_from_u32(unit0 as u32) {
            Some(cp) => (cp, ParseOutcome::Ok(2)),
            None => ('\u{0}', ParseOutcome::InvalidCharacter),
        }
    }

    pub fn encode_one(cp: CodePoint, out: &mut [u8], order: ByteOrder) -> ParseOutcome {
        let v = cp as u32;
        if v <= 0xFFFF {
            if out.len() < 2 {
                return ParseOutcome::IncompleteCharacter;
            }
            write_u16(out, v as u16, order);
            ParseOutcome::Ok(2)
        } else {
            if out.len() < 4 {
                return ParseOutcome::IncompleteCharacter;
            }
            let v = v - 0x10000;
            let high = 0xD800 + (v >> 10) as u16;
            let low = 0xDC00 + (v & 0x3FF) as u16;
            write_u16(out, high, order);
            write_u16(&mut out[2..], low, order);
            ParseOutcome::Ok(4)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_roundtrip_bmp_and_astral() {
        for cp in ['a', '\u{7FF}', '\u{FFFD}', '\u{10000}', '\u{10FFFF}'] {
            let mut buf = [0u8; 4];
            let outcome = Encoding::Utf8.encode_one(cp, &mut buf);
            let len = outcome.len().unwrap();
            let (decoded, dec_outcome) = Encoding::Utf8.decode_next(&buf[..len]);
            assert_eq!(dec_outcome, ParseOutcome::Ok(len));
            assert_eq!(decoded, cp);
        }
    }

    #[test]
    fn utf8_rejects_overlong_encoding() {
        // Overlong encoding of U+0000 as two bytes: C0 80.
        let (_, outcome) = Encoding::Utf8.decode_next(&[0xC0, 0x80]);
        assert_eq!(outcome, ParseOutcome::InvalidCharacter);
    }

    #[test]
    fn utf8_rejects_stray_continuation_byte() {
        let (_, outcome) = Encoding::Utf8.decode_next(&[0x80]);
        assert_eq!(outcome, ParseOutcome::InvalidCharacter);
    }

    #[test]
    fn utf8_truncated_sequence_is_incomplete_not_invalid() {
        // Lead byte for a 3-byte sequence with only one continuation byte.
        let (_, outcome) = Encoding::Utf8.decode_next(&[0xE2, 0x82]);
        assert_eq!(outcome, ParseOutcome::IncompleteCharacter);
    }

    #[test]
    fn utf16_surrogate_pair_roundtrips() {
        let cp = '\u{1F600}';
        let mut buf = [0u8; 4];
        Encoding::Utf16(ByteOrder::LittleEndian).encode_one(cp, &mut buf);
        let (decoded, outcome) =
            Encoding::Utf16(ByteOrder::LittleEndian).decode_next(&buf);
        assert_eq!(outcome, ParseOutcome::Ok(4));
        assert_eq!(decoded, cp);
    }

    #[test]
    fn utf16_lone_low_surrogate_is_invalid() {
        let bytes = 0xDC00u16.to_le_bytes();
        let (_, outcome) =
            Encoding::Utf16(ByteOrder::LittleEndian).decode_next(&bytes);
        assert_eq!(outcome, ParseOutcome::InvalidCharacter);
    }

    #[test]
    fn utf16_unpaired_high_surrogate_truncated_is_incomplete() {
        let bytes = 0xD800u16.to_le_bytes();
        let (_, outcome) =
            Encoding::Utf16(ByteOrder::LittleEndian).decode_next(&bytes);
        assert_eq!(outcome, ParseOutcome::IncompleteCharacter);
    }

    #[test]
    fn bom_detection() {
        assert!(Encoding::Utf8.has_bom(&[0xEF, 0xBB, 0xBF, b'<']));
        assert!(Encoding::Utf16(ByteOrder::BigEndian).has_bom(&[0xFE, 0xFF]));
        assert!(Encoding::Utf16(ByteOrder::LittleEndian).has_bom(&[0xFF, 0xFE]));
        assert!(!Encoding::Utf8.has_bom(b"<root/>"));
    }

    #[test]
    fn encoding_name_recognition() {
        assert!(Encoding::Utf8.is_supported_encoding_name(b"UTF-8"));
        assert!(!Encoding::Utf8.is_supported_encoding_name(b"UTF-16"));
        assert!(Encoding::Utf16(ByteOrder::LittleEndian).is_supported_encoding_name(b"UTF-16"));
        assert!(Encoding::Utf16(ByteOrder::BigEndian).is_supported_encoding_name(b"UTF-16"));
    }
}
