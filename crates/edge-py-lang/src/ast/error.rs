use smol_str::SmolStr;
use thiserror::Error;

use crate::Token;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum ParseError {
    #[error("Unexpected token `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string().escape_default().to_string() })]
    UnexpectedToken(Token),
    #[error("Unexpected EOF detected")]
    UnexpectedEOFDetected(Token),
    #[error("Expected a closing parenthesis `)` but got `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string().escape_default().to_string() })]
    ExpectedClosingParen(Token),
    #[error("Expected a closing bracket `]` but got `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string().escape_default().to_string() })]
    ExpectedClosingBracket(Token),
    #[error("Expected a closing brace `}}` but got `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string().escape_default().to_string() })]
    ExpectedClosingBrace(Token),
    #[error("Duplicate argument `{1}` in lambda definition")]
    DuplicateParameter(Token, SmolStr),
    #[error("Expression is nested too deeply")]
    NestingTooDeep(Token),
}

impl ParseError {
    pub fn token(&self) -> &Token {
        match self {
            ParseError::UnexpectedToken(token)
            | ParseError::UnexpectedEOFDetected(token)
            | ParseError::ExpectedClosingParen(token)
            | ParseError::ExpectedClosingBracket(token)
            | ParseError::ExpectedClosingBrace(token)
            | ParseError::DuplicateParameter(token, _)
            | ParseError::NestingTooDeep(token) => token,
        }
    }
}
