use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First syntax error of a decision tree. `line` and `offset` (column) are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("syntax error at line {line}, column {offset}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub offset: usize,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>, line: usize, offset: usize) -> Self {
        Self {
            message: message.into(),
            line,
            offset,
        }
    }
}
