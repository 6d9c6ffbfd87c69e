use thiserror::Error;

/// Errors raised while reading serialized markup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected character at byte {offset}")]
    UnexpectedCharacter { offset: usize },

    #[error("end tag </{name}> at byte {offset} closes no open element")]
    UnmatchedEndTag { name: String, offset: usize },
}

/// Errors raised by commands. A command that merely does not apply to the
/// current state is not an error; it reports "not applied" instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("range {from}..{to} is outside the document (size {size})")]
    InvalidRange { from: usize, to: usize, size: usize },

    #[error("a table needs at least one row and one column, got {rows}x{cols}")]
    InvalidTableShape { rows: usize, cols: usize },

    #[error("font family must not be empty")]
    InvalidFontFamily,

    #[error("invalid width {0:?}")]
    InvalidWidth(String),

    #[error("invalid content: {0}")]
    InvalidContent(#[from] ParseError),
}
