//! The incremental pull parser: the grammar state machine plus the resume
//! layer that owns the input buffer.
//!
//! Every interior pointer this design calls an "anchor" is kept here as a
//! plain `usize` byte offset into `XmlParser::buf`, never a raw pointer, so
//! `append_data`, which may reallocate the backing `Vec<u8>`, needs no
//! pointer-fixup step at all. Only `compact`, which physically discards
//! bytes at the front of the buffer, has to shift offsets, and it does so
//! explicitly below.

use crate::codec::{CodePoint, Encoding, ParseOutcome};
use crate::error::Error;
use crate::name::{is_name_char, is_name_start_char};
use crate::stack::ParseStack;
use crate::text::{decode_text, TextOutcome, TextType};
use crate::token::TokenKind;

/// Byte offsets into the input buffer, plus whether the codec can hand
/// back zero-copy slices, determine which of the two representations a
/// decoded name lives in.
#[derive(Clone, Debug)]
enum DecodedName {
    Borrowed(usize, usize),
    Owned(Vec<u8>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TagEventKind {
    Open,
    Close,
}

/// A recorded byte anchor plus the parse stack depth at that point, lazily
/// upgraded to an owned snapshot only when a pop is about to invalidate the
/// live stack's relevant frames.
struct Savepoint {
    anchor: usize,
    saved_depth: usize,
    snapshot: Option<ParseStack>,
}

/// A condition that stops a sub-parse before it produces a token: either
/// "not enough bytes yet" or a concrete taxonomy error. Never escapes this
/// module; every caller converts it into a `TokenKind` via
/// `XmlParser::handle_signal`.
enum Signal {
    Incomplete,
    Err(Error),
}

impl From<Error> for Signal {
    fn from(e: Error) -> Signal {
        Signal::Err(e)
    }
}

/// The incremental, resumable, in-place XML 1.0 pull parser.
///
/// Construct one with [`create_parser`] or [`create_parser_owned`], then
/// drive it with [`parse_next`](XmlParser::parse_next) and read the
/// current token through `current_tag_name`/`current_attr_name`/
/// `current_value`. See the crate-level documentation for the resume
/// protocol (`append_data` / `set_savepoint_at_current_tag` /
/// `restore_to_savepoint`).
pub struct XmlParser {
    buf: Vec<u8>,
    encoding: Encoding,
    read_cursor: usize,
    last_tag_start: usize,
    last_tag_kind: TagEventKind,
    stack: ParseStack,
    token: TokenKind,
    /// The token kind a retried `parse_next` should dispatch from, when
    /// `token == IncompleteDocument`. Every sub-parser below is written
    /// so it mutates `self` only at its final, successful commit point,
    /// so simply re-entering the same sub-parser on retry is correct,
    /// except for the deferred stack pop on `CloseTag`, which is guarded
    /// separately by `popped`.
    resume_from: TokenKind,
    /// Set once `CloseTag`'s deferred pop has happened for the *current*
    /// `CloseTag` token, so a retry after `IncompleteDocument` doesn't
    /// pop a second time.
    popped: bool,
    error: Option<Error>,
    value_buf: Vec<u8>,
    attr_name: DecodedName,
    savepoint: Option<Savepoint>,
}

/// Build a parser over a copy of `bytes`. The codec and BOM-skip length
/// are chosen by inspecting the leading bytes (the factory's BOM-sniff
/// rule).
pub fn create_parser(bytes: &[u8]) -> XmlParser {
    create_parser_owned(bytes.to_vec())
}

/// Build a parser that takes ownership of `bytes` without copying.
pub fn create_parser_owned(bytes: Vec<u8>) -> XmlParser {
    let (encoding, bom_len) = Encoding::detect(&bytes);
    let stack = match encoding {
        Encoding::Utf8 => ParseStack::new_borrowed(),
        Encoding::Utf16(_) => ParseStack::new_owned(),
    };
    XmlParser {
        buf: bytes,
        encoding,
        read_cursor: bom_len,
        last_tag_start: bom_len,
        last_tag_kind: TagEventKind::Open,
        stack,
        token: TokenKind::InitialState,
        resume_from: TokenKind::InitialState,
        popped: false,
        error: None,
        value_buf: Vec::new(),
        attr_name: DecodedName::Borrowed(0, 0),
        savepoint: None,
    }
}

impl XmlParser {
    /// Advance the state machine by exactly one token event.
    pub fn parse_next(&mut self) -> TokenKind {
        if matches!(self.token, TokenKind::Error | TokenKind::CloseDocument) {
            return self.token;
        }
        let from = if self.token == TokenKind::IncompleteDocument {
            self.resume_from
        } else {
            self.token
        };
        self.resume_from = from;
        match from {
            TokenKind::InitialState => self.parse_initial(),
            TokenKind::OpenDocument => self.parse_root_open(),
            TokenKind::OpenTag | TokenKind::Attribute => self.parse_inside_tag(),
            TokenKind::Text => self.parse_after_text(),
            TokenKind::CloseTag => self.parse_after_close_tag(),
            TokenKind::IncompleteDocument | TokenKind::CloseDocument | TokenKind::Error => {
                unreachable!("terminal/incomplete states are handled above")
            }
        }
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.token
    }

    /// The taxonomy row behind the current `Error` token, if any.
    pub fn current_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn current_tag_name(&self) -> &[u8] {
        match self.encoding {
            Encoding::Utf8 => match self.stack.top_borrowed() {
                Some((s, e)) => &self.buf[s..e],
                None => &[],
            },
            Encoding::Utf16(_) => self.stack.top_owned().unwrap_or(&[]),
        }
    }

    pub fn current_attr_name(&self) -> &[u8] {
        match &self.attr_name {
            DecodedName::Borrowed(s, e) => &self.buf[*s..*e],
            DecodedName::Owned(v) => v.as_slice(),
        }
    }

    pub fn current_value(&self) -> &[u8] {
        &self.value_buf
    }

    /// Append `bytes` to the input buffer, compacting first. No-op if the
    /// parser is already in `Error`.
    pub fn append_data(&mut self, bytes: &[u8]) {
        if self.token == TokenKind::Error {
            return;
        }
        self.compact();
        self.buf.extend_from_slice(bytes);
    }

    /// Discard bytes no anchor still needs, sliding every remaining
    /// offset by the same delta. Skipped when the parser is mid-construct
    /// with no savepoint to protect.
    fn compact(&mut self) {
        if self.token == TokenKind::IncompleteDocument && self.savepoint.is_none() {
            return;
        }
        let mut anchor = self.read_cursor;
        if let Some(sp) = &self.savepoint {
            anchor = anchor.min(sp.anchor);
            if let Some(snap) = &sp.snapshot {
                if let Some(s) = snap.earliest_borrowed_start() {
                    anchor = anchor.min(s);
                }
            }
        }
        anchor = anchor.min(self.last_tag_start);
        if let Some(s) = self.stack.earliest_borrowed_start() {
            anchor = anchor.min(s);
        }
        if let DecodedName::Borrowed(s, _) = &self.attr_name {
            anchor = anchor.min(*s);
        }
        if anchor == 0 {
            return;
        }

        self.buf.drain(0..anchor);
        let delta = -(anchor as isize);
        self.stack.add_offset(delta);
        self.read_cursor -= anchor;
        self.last_tag_start -= anchor;
        if let DecodedName::Borrowed(s, e) = &mut self.attr_name {
            *s -= anchor;
            *e -= anchor;
        }
        if let Some(sp) = &mut self.savepoint {
            sp.anchor -= anchor;
            if let Some(snap) = &mut sp.snapshot {
                snap.add_offset(delta);
            }
        }
    }

    /// Record the current tag's start and the parse-stack depth of its
    /// parent (or, for a `CloseTag` not yet popped, its own still-present
    /// frame). Valid only in `OpenTag`, `Attribute`, `Text`, `CloseTag`.
    pub fn set_savepoint_at_current_tag(&mut self) -> bool {
        if !matches!(
            self.token,
            TokenKind::OpenTag | TokenKind::Attribute | TokenKind::Text | TokenKind::CloseTag
        ) {
            return false;
        }
        let saved_depth = match self.last_tag_kind {
            TagEventKind::Open => self.stack.depth().saturating_sub(1),
            TagEventKind::Close => self.stack.depth(),
        };
        self.savepoint = Some(Savepoint {
            anchor: self.last_tag_start,
            saved_depth,
            snapshot: None,
        });
        true
    }

    /// Rewind to the savepoint's anchor and re-enter the tag that starts
    /// there. Returns `false` only if no savepoint was set.
    pub fn restore_to_savepoint(&mut self) -> bool {
        let sp = match self.savepoint.take() {
            Some(s) => s,
            None => return false,
        };
        self.read_cursor = sp.anchor;
        match sp.snapshot {
            Some(snap) => self.stack = snap,
            None => self.stack.truncate(sp.saved_depth),
        }
        self.popped = false;
        self.error = None;

        let encoding = self.encoding;
        let anchor = sp.anchor;
        match peek_char(&self.buf, anchor, encoding) {
            Ok((c, n)) if c == '<' => match peek_char(&self.buf, anchor + n, encoding) {
                Ok((c2, n2)) if c2 == '/' => {
                    self.parse_close_tag(anchor, anchor + n + n2);
                }
                Ok((c2, _)) if is_name_start_char(c2) => {
                    self.parse_open_tag(anchor, anchor + n);
                }
                Ok(_) => {
                    self.fail(Error::UnexpectedByte);
                }
                Err(s) => {
                    self.handle_signal(s);
                }
            },
            Ok(_) => {
                self.fail(Error::UnexpectedByte);
            }
            Err(s) => {
                self.handle_signal(s);
            }
        }
        true
    }

    /// Reclaim the owned input buffer; the parser cannot be used again.
    pub fn extract_xml_data(self) -> Vec<u8> {
        self.buf
    }

    fn fail(&mut self, e: Error) -> TokenKind {
        self.token = TokenKind::Error;
        self.error = Some(e);
        TokenKind::Error
    }

    fn incomplete(&mut self) -> TokenKind {
        self.token = TokenKind::IncompleteDocument;
        TokenKind::IncompleteDocument
    }

    fn handle_signal(&mut self, s: Signal) -> TokenKind {
        match s {
            Signal::Incomplete => self.incomplete(),
            Signal::Err(e) => self.fail(e),
        }
    }

    fn commit_attr_name(&mut self, start: usize, end: usize) {
        self.attr_name = match self.encoding {
            Encoding::Utf8 => DecodedName::Borrowed(start, end),
            Encoding::Utf16(_) => {
                DecodedName::Owned(transcode_range_to_utf8(&self.buf, start, end, self.encoding))
            }
        };
    }

    fn stack_top_equals(&self, name_start: usize, name_end: usize) -> bool {
        match self.encoding {
            Encoding::Utf8 => match self.stack.top_borrowed() {
                Some((ts, te)) => self.buf[name_start..name_end] == self.buf[ts..te],
                None => false,
            },
            Encoding::Utf16(_) => {
                let new_name = transcode_range_to_utf8(&self.buf, name_start, name_end, self.encoding);
                self.stack.top_owned().map(|t| t == new_name.as_slice()).unwrap_or(false)
            }
        }
    }

    fn slice_name_as_string(&self, start: usize, end: usize) -> String {
        match self.encoding {
            Encoding::Utf8 => String::from_utf8_lossy(&self.buf[start..end]).into_owned(),
            Encoding::Utf16(_) => {
                String::from_utf8_lossy(&transcode_range_to_utf8(&self.buf, start, end, self.encoding))
                    .into_owned()
            }
        }
    }

    fn current_tag_name_as_string(&self) -> String {
        String::from_utf8_lossy(self.current_tag_name()).into_owned()
    }

    // ---- InitialState ----------------------------------------------

    fn parse_initial(&mut self) -> TokenKind {
        let encoding = self.encoding;
        let pos = match skip_ws(&self.buf, self.read_cursor, encoding) {
            Ok(p) => p,
            Err(s) => return self.handle_signal(s),
        };
        match peek_char(&self.buf, pos, encoding) {
            Ok((c, n)) if c == '<' => match peek_char(&self.buf, pos + n, encoding) {
                Ok((c2, n2)) if c2 == '?' => match parse_xml_decl(&self.buf, pos + n + n2, encoding) {
                    Ok(new_pos) => {
                        self.read_cursor = new_pos;
                        self.token = TokenKind::OpenDocument;
                        TokenKind::OpenDocument
                    }
                    Err(s) => self.handle_signal(s),
                },
                Ok(_) => {
                    self.read_cursor = pos;
                    self.token = TokenKind::OpenDocument;
                    TokenKind::OpenDocument
                }
                Err(s) => self.handle_signal(s),
            },
            Ok(_) => self.fail(Error::UnexpectedByte),
            Err(s) => self.handle_signal(s),
        }
    }

    // ---- OpenDocument: expect the root element ----------------------

    fn parse_root_open(&mut self) -> TokenKind {
        let encoding = self.encoding;
        let pos = match skip_ws(&self.buf, self.read_cursor, encoding) {
            Ok(p) => p,
            Err(s) => return self.handle_signal(s),
        };
        match peek_char(&self.buf, pos, encoding) {
            Ok((c, n)) if c == '<' => match peek_char(&self.buf, pos + n, encoding) {
                Ok((c2, _)) if is_name_start_char(c2) => self.parse_open_tag(pos, pos + n),
                Ok(_) => self.fail(Error::UnexpectedByte),
                Err(s) => self.handle_signal(s),
            },
            Ok(_) => self.fail(Error::UnexpectedByte),
            Err(s) => self.handle_signal(s),
        }
    }

    // ---- OpenTag / Attribute: attributes, `>`, `/>` ------------------

    fn parse_inside_tag(&mut self) -> TokenKind {
        let encoding = self.encoding;
        let pos = match skip_ws(&self.buf, self.read_cursor, encoding) {
            Ok(p) => p,
            Err(s) => return self.handle_signal(s),
        };
        let (c, n) = match peek_char(&self.buf, pos, encoding) {
            Ok(v) => v,
            Err(s) => return self.handle_signal(s),
        };

        if c == '/' {
            let after_slash = pos + n;
            let (c2, n2) = match peek_char(&self.buf, after_slash, encoding) {
                Ok(v) => v,
                Err(s) => return self.handle_signal(s),
            };
            if c2 != '>' {
                return self.fail(Error::UnexpectedByte);
            }
            self.read_cursor = after_slash + n2;
            self.last_tag_kind = TagEventKind::Close;
            self.popped = false;
            self.token = TokenKind::CloseTag;
            return TokenKind::CloseTag;
        }

        if c == '>' {
            return self.after_tag_close_angle(pos + n);
        }

        if !is_name_start_char(c) {
            return self.fail(Error::UnexpectedByte);
        }
        let name_start = pos;
        let name_end = match scan_name_rest(&self.buf, pos + n, encoding) {
            Ok(e) => e,
            Err(s) => return self.handle_signal(s),
        };
        let p = match skip_ws(&self.buf, name_end, encoding) {
            Ok(p) => p,
            Err(s) => return self.handle_signal(s),
        };
        let (eqc, eqn) = match peek_char(&self.buf, p, encoding) {
            Ok(v) => v,
            Err(s) => return self.handle_signal(s),
        };
        if eqc != '=' {
            return self.fail(Error::UnexpectedByte);
        }
        let p = match skip_ws(&self.buf, p + eqn, encoding) {
            Ok(p) => p,
            Err(s) => return self.handle_signal(s),
        };
        let (qc, qn) = match peek_char(&self.buf, p, encoding) {
            Ok(v) => v,
            Err(s) => return self.handle_signal(s),
        };
        let text_type = match qc {
            '"' => TextType::AttValueQuote,
            '\'' => TextType::AttValueApos,
            _ => return self.fail(Error::UnexpectedByte),
        };
        let value_start = p + qn;

        let mut out = std::mem::take(&mut self.value_buf);
        let outcome = decode_text(&self.buf, value_start, self.buf.len(), encoding, text_type, &mut out);
        match outcome {
            TextOutcome::AtEnd { new_cursor } => {
                self.value_buf = out;
                self.commit_attr_name(name_start, name_end);
                self.read_cursor = new_cursor;
                self.token = TokenKind::Attribute;
                TokenKind::Attribute
            }
            TextOutcome::IncompleteText { .. } => {
                self.value_buf = out;
                self.incomplete()
            }
            TextOutcome::Error(e) => {
                self.value_buf = out;
                self.fail(e)
            }
        }
    }

    fn after_tag_close_angle(&mut self, pos: usize) -> TokenKind {
        let encoding = self.encoding;
        match peek_char(&self.buf, pos, encoding) {
            Ok((c, n)) if c == '<' => self.dispatch_after_lt(pos, pos + n),
            Ok(_) => self.start_text(pos),
            Err(s) => self.handle_signal(s),
        }
    }

    fn dispatch_after_lt(&mut self, lt_pos: usize, after_lt: usize) -> TokenKind {
        let encoding = self.encoding;
        match peek_char(&self.buf, after_lt, encoding) {
            Ok((c, n)) if c == '/' => self.parse_close_tag(lt_pos, after_lt + n),
            Ok((c, _)) if is_name_start_char(c) => self.parse_open_tag(lt_pos, after_lt),
            Ok(_) => self.fail(Error::UnexpectedByte),
            Err(s) => self.handle_signal(s),
        }
    }

    fn parse_open_tag(&mut self, lt_pos: usize, name_start: usize) -> TokenKind {
        let encoding = self.encoding;
        let name_end = match scan_name_full(&self.buf, name_start, encoding) {
            Ok(e) => e,
            Err(s) => return self.handle_signal(s),
        };
        match encoding {
            Encoding::Utf8 => self.stack.push_borrowed(name_start, name_end),
            Encoding::Utf16(_) => {
                let name = transcode_range_to_utf8(&self.buf, name_start, name_end, encoding);
                self.stack.push_owned(&name);
            }
        }
        self.last_tag_start = lt_pos;
        self.last_tag_kind = TagEventKind::Open;
        self.read_cursor = name_end;
        self.token = TokenKind::OpenTag;
        TokenKind::OpenTag
    }

    fn parse_close_tag(&mut self, lt_pos: usize, name_start: usize) -> TokenKind {
        let encoding = self.encoding;
        let name_end = match scan_name_full(&self.buf, name_start, encoding) {
            Ok(e) => e,
            Err(s) => return self.handle_signal(s),
        };
        if !self.stack_top_equals(name_start, name_end) {
            let found = self.slice_name_as_string(name_start, name_end);
            let expected = self.current_tag_name_as_string();
            return self.fail(Error::TagMismatch { expected, found });
        }
        let p = match skip_ws(&self.buf, name_end, encoding) {
            Ok(p) => p,
            Err(s) => return self.handle_signal(s),
        };
        let p = match peek_char(&self.buf, p, encoding) {
            Ok((c, n)) if c == '>' => p + n,
            Ok(_) => return self.fail(Error::UnexpectedByte),
            Err(s) => return self.handle_signal(s),
        };
        self.last_tag_start = lt_pos;
        self.last_tag_kind = TagEventKind::Close;
        self.read_cursor = p;
        self.popped = false;
        self.token = TokenKind::CloseTag;
        TokenKind::CloseTag
    }

    // ---- Text ---------------------------------------------------------

    fn start_text(&mut self, pos: usize) -> TokenKind {
        let encoding = self.encoding;
        let mut out = std::mem::take(&mut self.value_buf);
        let outcome = decode_text(&self.buf, pos, self.buf.len(), encoding, TextType::CharData, &mut out);
        match outcome {
            TextOutcome::AtEnd { new_cursor } => {
                self.value_buf = out;
                self.read_cursor = new_cursor;
                self.token = TokenKind::Text;
                TokenKind::Text
            }
            TextOutcome::IncompleteText { .. } => {
                self.value_buf = out;
                self.incomplete()
            }
            TextOutcome::Error(e) => {
                self.value_buf = out;
                self.fail(e)
            }
        }
    }

    fn parse_after_text(&mut self) -> TokenKind {
        let encoding = self.encoding;
        let pos = self.read_cursor;
        match peek_char(&self.buf, pos, encoding) {
            Ok((c, n)) if c == '<' => self.dispatch_after_lt(pos, pos + n),
            Ok(_) => self.fail(Error::UnexpectedByte),
            Err(s) => self.handle_signal(s),
        }
    }

    // ---- CloseTag: deferred pop, then continue -------------------------

    fn parse_after_close_tag(&mut self) -> TokenKind {
        if !self.popped {
            if let Some(sp) = &self.savepoint {
                if sp.snapshot.is_none() && self.stack.depth() == sp.saved_depth {
                    let snap = self.stack.snapshot();
                    if let Some(sp) = &mut self.savepoint {
                        sp.snapshot = Some(snap);
                    }
                }
            }
            self.stack.pop();
            self.popped = true;
        }
        if self.stack.is_empty() {
            self.token = TokenKind::CloseDocument;
            return TokenKind::CloseDocument;
        }
        let encoding = self.encoding;
        let pos = self.read_cursor;
        match peek_char(&self.buf, pos, encoding) {
            Ok((c, n)) if c == '<' => self.dispatch_after_lt(pos, pos + n),
            Ok(_) => self.start_text(pos),
            Err(s) => self.handle_signal(s),
        }
    }
}

// --- Free scanning helpers: pure functions over (buf, pos, encoding) ----

fn peek_char(buf: &[u8], pos: usize, encoding: Encoding) -> Result<(CodePoint, usize), Signal> {
    if pos >= buf.len() {
        return Err(Signal::Incomplete);
    }
    match encoding.decode_next(&buf[pos..]) {
        (cp, ParseOutcome::Ok(n)) => Ok((cp, n)),
        (_, ParseOutcome::IncompleteCharacter) => Err(Signal::Incomplete),
        (_, ParseOutcome::InvalidCharacter) => Err(Signal::Err(Error::MalformedEncoding)),
    }
}

fn skip_ws(buf: &[u8], pos: usize, encoding: Encoding) -> Result<usize, Signal> {
    let mut p = pos;
    loop {
        match peek_char(buf, p, encoding) {
            Ok((c, n)) if matches!(c, ' ' | '\t' | '\r' | '\n') => p += n,
            Ok(_) => return Ok(p),
            Err(Signal::Incomplete) => return Ok(p),
            Err(e) => return Err(e),
        }
    }
}

fn scan_name_rest(buf: &[u8], pos: usize, encoding: Encoding) -> Result<usize, Signal> {
    let mut p = pos;
    loop {
        match peek_char(buf, p, encoding) {
            Ok((c, n)) if is_name_char(c) => p += n,
            Ok(_) => return Ok(p),
            Err(e) => return Err(e),
        }
    }
}

/// `pos` must already be known to start a `NameStartChar` (callers verify
/// this with a one-char lookahead before calling).
fn scan_name_full(buf: &[u8], pos: usize, encoding: Encoding) -> Result<usize, Signal> {
    let (_, n) = peek_char(buf, pos, encoding)?;
    scan_name_rest(buf, pos + n, encoding)
}

fn transcode_range_to_utf8(buf: &[u8], mut pos: usize, end: usize, encoding: Encoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(end.saturating_sub(pos));
    while pos < end {
        let (cp, outcome) = encoding.decode_next(&buf[pos..end]);
        match outcome {
            ParseOutcome::Ok(n) => {
                Encoding::Utf8.append_to(&mut out, cp);
                pos += n;
            }
            _ => break,
        }
    }
    out
}

/// `Name = "value"` or `Name = 'value'`, used only inside the `<?xml ... ?>`
/// declaration (plain ASCII-grammar attributes, no entity expansion).
fn parse_pseudo_attr(
    buf: &[u8],
    pos: usize,
    encoding: Encoding,
) -> Result<(Vec<u8>, Vec<u8>, usize), Signal> {
    let name_start = pos;
    let (c0, n0) = peek_char(buf, pos, encoding)?;
    if !is_name_start_char(c0) {
        return Err(Signal::Err(Error::UnexpectedByte));
    }
    let name_end = scan_name_rest(buf, pos + n0, encoding)?;
    let name = transcode_range_to_utf8(buf, name_start, name_end, encoding);

    let p = skip_ws(buf, name_end, encoding)?;
    let (eqc, eqn) = peek_char(buf, p, encoding)?;
    if eqc != '=' {
        return Err(Signal::Err(Error::UnexpectedByte));
    }
    let p = skip_ws(buf, p + eqn, encoding)?;
    let (qc, qn) = peek_char(buf, p, encoding)?;
    if qc != '"' && qc != '\'' {
        return Err(Signal::Err(Error::UnexpectedByte));
    }
    let value_start = p + qn;
    let mut p = value_start;
    loop {
        let (c, n) = peek_char(buf, p, encoding)?;
        if c == qc {
            let value = transcode_range_to_utf8(buf, value_start, p, encoding);
            return Ok((name, value, p + n));
        }
        p += n;
    }
}

/// Parse the body of `<?xml ... ?>` starting just after `<?`. `version`,
/// if present, must start with `1.`; `encoding`, if present, must be
/// recognised by `encoding`. Neither is required to appear; `standalone`
/// and any other pseudo-attribute is accepted and ignored. Returns the
/// position just past the closing `?>`.
fn parse_xml_decl(buf: &[u8], pos: usize, encoding: Encoding) -> Result<usize, Signal> {
    let mut p = pos;
    for expected in [b'x', b'm', b'l'] {
        let (c, n) = peek_char(buf, p, encoding)?;
        if c as u32 != expected as u32 {
            return Err(Signal::Err(Error::UnexpectedByte));
        }
        p += n;
    }

    loop {
        p = skip_ws(buf, p, encoding)?;
        let (c, _) = peek_char(buf, p, encoding)?;
        if c == '?' {
            break;
        }
        let (name, value, new_p) = parse_pseudo_attr(buf, p, encoding)?;
        p = new_p;
        match name.as_slice() {
            b"version" => {
                if !(value.len() >= 2 && value[0] == b'1' && value[1] == b'.') {
                    return Err(Signal::Err(Error::BadVersion(
                        String::from_utf8_lossy(&value).into_owned(),
                    )));
                }
            }
            b"encoding" => {
                if !encoding.is_supported_encoding_name(&value) {
                    return Err(Signal::Err(Error::UnsupportedEncoding(
                        String::from_utf8_lossy(&value).into_owned(),
                    )));
                }
            }
            _ => {} // `standalone`, or anything else: accepted, ignored
        }
    }

    let (c1, n1) = peek_char(buf, p, encoding)?;
    if c1 != '?' {
        return Err(Signal::Err(Error::UnexpectedByte));
    }
    p += n1;
    let (c2, n2) = peek_char(buf, p, encoding)?;
    if c2 != '>' {
        return Err(Signal::Err(Error::UnexpectedByte));
    }
    Ok(p + n2)
}
