//! The token kinds the pull parser's state machine can land on.

/// One step of the parser's progress through a document. `parse_next`
/// advances by exactly one transition and returns the new `TokenKind`.
///
/// `IncompleteDocument` and `Error` are the only "not OK" states; every
/// other variant corresponds to a grammar construct the caller can read
/// through `current_tag_name`/`current_attr_name`/`current_value`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Before any byte has been consumed.
    InitialState,
    /// The optional `<?xml ... ?>` declaration has been consumed (or
    /// skipped, if absent).
    OpenDocument,
    /// `<Name` has been consumed; `current_tag_name()` is valid.
    OpenTag,
    /// `Name="value"` has been consumed inside an open tag;
    /// `current_attr_name()` and `current_value()` are valid.
    Attribute,
    /// Character data has been decoded up to (but not including) the next
    /// `<`; `current_value()` is valid.
    Text,
    /// `</Name>` (or the `/>` of an empty element) has been consumed;
    /// `current_tag_name()` names the element being closed.
    CloseTag,
    /// The root element's `CloseTag` has been observed and the stack is
    /// empty. Terminal on success.
    CloseDocument,
    /// The input buffer ran out mid-construct. Recoverable via
    /// `append_data` (and, if a savepoint was set, `restore_to_savepoint`).
    IncompleteDocument,
    /// The document is malformed. Terminal: every subsequent `parse_next`
    /// call returns `Error` again.
    Error,
}

impl TokenKind {
    /// `true` for the two "not OK" states that are not plain progress.
    pub fn is_terminal_error(self) -> bool {
        matches!(self, TokenKind::Error)
    }

    /// `true` once no further tokens will ever be produced.
    pub fn is_terminal(self) -> bool {
        matches!(self, TokenKind::Error | TokenKind::CloseDocument)
    }
}
