//! Command parsing errors.

use thiserror::Error;

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Command parsing errors.
///
/// The line grammar treats blank and malformed lines as silently ignorable,
/// so these errors never abort the request loop; callers drop them (or log
/// them in verbose mode).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    EmptyLine,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command} expects {expected} argument(s), got {got}")]
    WrongArgCount {
        command: &'static str,
        expected: usize,
        got: usize,
    },
}
