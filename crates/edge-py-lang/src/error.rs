use miette::{Diagnostic, SourceOffset, SourceSpan};

use crate::{ast::error::ParseError, eval::error::EvalError, lexer::error::LexerError, range::Range};

#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum InnerError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl InnerError {
    pub fn range(&self) -> &Range {
        match self {
            InnerError::Lexer(err) => err.range(),
            InnerError::Parse(err) => &err.token().range,
            InnerError::Eval(err) => err.range(),
        }
    }
}

/// An error raised while tokenizing, parsing or evaluating a script, with the
/// script text attached for diagnostics.
#[derive(PartialEq, Debug, Clone, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: InnerError,
    /// The script the error was raised from.
    pub source_code: String,
    /// Where in `source_code` the error points.
    pub location: SourceSpan,
}

impl Error {
    pub fn from_error(source_code: impl Into<String>, cause: InnerError) -> Self {
        let source_code = source_code.into();
        let range = cause.range();
        let start = offset(&source_code, range, true);
        let end = offset(&source_code, range, false);
        let location = SourceSpan::new(
            SourceOffset::from(start),
            std::cmp::max(end.saturating_sub(start), 1),
        );

        Self {
            cause,
            source_code,
            location,
        }
    }
}

fn offset(source_code: &str, range: &Range, start: bool) -> usize {
    let position = if start { range.start } else { range.end };
    SourceOffset::from_location(source_code, position.line as usize, position.column).offset()
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match &self.cause {
            InnerError::Lexer(LexerError::UnexpectedCharacter(..)) => "LexerError::UnexpectedCharacter",
            InnerError::Lexer(LexerError::UnterminatedString(_)) => "LexerError::UnterminatedString",
            InnerError::Lexer(LexerError::InvalidNumber(..)) => "LexerError::InvalidNumber",
            InnerError::Lexer(LexerError::UnexpectedEOFDetected(_)) => "LexerError::UnexpectedEOFDetected",
            InnerError::Parse(ParseError::UnexpectedToken(_)) => "ParseError::UnexpectedToken",
            InnerError::Parse(ParseError::UnexpectedEOFDetected(_)) => "ParseError::UnexpectedEOFDetected",
            InnerError::Parse(ParseError::ExpectedClosingParen(_)) => "ParseError::ExpectedClosingParen",
            InnerError::Parse(ParseError::ExpectedClosingBracket(_)) => "ParseError::ExpectedClosingBracket",
            InnerError::Parse(ParseError::ExpectedClosingBrace(_)) => "ParseError::ExpectedClosingBrace",
            InnerError::Parse(ParseError::DuplicateParameter(..)) => "ParseError::DuplicateParameter",
            InnerError::Parse(ParseError::NestingTooDeep(_)) => "ParseError::NestingTooDeep",
            InnerError::Eval(err) => return Some(Box::new(format!("EvalError::{}", err.name()))),
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match &self.cause {
            InnerError::Lexer(LexerError::UnterminatedString(_)) => {
                Some("Close the string with the same quote character that opened it.".to_string())
            }
            InnerError::Lexer(_) => Some("Check for characters that are not valid in an expression.".to_string()),
            InnerError::Parse(ParseError::UnexpectedEOFDetected(_)) => Some(
                "Input ended unexpectedly. Check for missing closing brackets or incomplete expressions."
                    .to_string(),
            ),
            InnerError::Parse(ParseError::DuplicateParameter(_, name)) => {
                Some(format!("Rename one of the `{name}` parameters."))
            }
            InnerError::Parse(ParseError::NestingTooDeep(_)) => {
                Some("Split the expression into smaller lambdas or reduce the number of chained operators.".to_string())
            }
            InnerError::Parse(_) => Some("A script must consist of a single expression.".to_string()),
            InnerError::Eval(EvalError::NameError(_, name)) => {
                Some(format!("'{name}' is not a lambda parameter or builtin."))
            }
            InnerError::Eval(EvalError::RecursionError(..)) => {
                Some("Raise `max_call_depth` or `max_nesting_depth`, or reduce the nesting of lambda calls.".to_string())
            }
            InnerError::Eval(_) => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(miette::LabeledSpan::new_with_span(
            Some(format!("{}", self.cause)),
            self.location,
        ))))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_code)
    }
}
