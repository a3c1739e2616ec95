use thiserror::Error;

use crate::range::Range;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum LexerError {
    #[error("Invalid character `{0}`")]
    UnexpectedCharacter(char, Range),
    #[error("Unterminated string literal")]
    UnterminatedString(Range),
    #[error("Invalid number literal `{0}`")]
    InvalidNumber(String, Range),
    #[error("Unexpected EOF detected")]
    UnexpectedEOFDetected(Range),
}

impl LexerError {
    pub fn range(&self) -> &Range {
        match self {
            LexerError::UnexpectedCharacter(_, range)
            | LexerError::UnterminatedString(range)
            | LexerError::InvalidNumber(_, range)
            | LexerError::UnexpectedEOFDetected(range) => range,
        }
    }
}
