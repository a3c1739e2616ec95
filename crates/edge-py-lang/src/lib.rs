//! `edge-py-lang` is a small embedded interpreter for Python lambda expressions.
//!
//! It understands the expression subset of Python needed to write single-expression
//! scripts such as `lambda x: x + 1`: literals, arithmetic, comparisons, conditional
//! expressions, list comprehensions, closures and a handful of builtins.
//!
//! ## Examples
//!
//! ```rust
//! use edge_py_lang::{Engine, Value};
//!
//! let mut engine = Engine::default();
//! let func = engine.eval("lambda x: x + 1").unwrap();
//!
//! assert_eq!(engine.arity(&func), Some(1));
//! assert_eq!(engine.call(&func, vec![Value::Int(41)]).unwrap(), Value::Int(42));
//!
//! // Parse code into an AST
//! let program = edge_py_lang::parse("[x * 2 for x in range(3)]").unwrap();
//! assert!(matches!(program.expr, edge_py_lang::AstExpr::ListComp(_)));
//! ```
mod ast;
mod engine;
mod error;
mod eval;
mod lexer;
mod range;
mod value;

use error::InnerError;
use lexer::Lexer;

pub use ast::Program;
pub use ast::error::ParseError;
pub use ast::node::Expr as AstExpr;
pub use ast::node::Literal as AstLiteral;
pub use ast::node::Node as AstNode;
pub use ast::parser::{MAX_NESTING_DEPTH, Parser as AstParser};
pub use engine::{Engine, Options};
pub use error::Error;
pub use eval::Options as EvalOptions;
pub use eval::error::EvalError;
pub use lexer::Options as LexerOptions;
pub use lexer::error::LexerError;
pub use lexer::token::{Token, TokenKind};
pub use range::{Position, Range};
pub use value::{ConversionError, Function, Value};

/// Tokenizes `code`; the stream always ends with an `Eof` token.
pub fn tokenize(code: &str, options: LexerOptions) -> Result<Vec<Token>, LexerError> {
    Lexer::new(options).tokenize(code)
}

#[allow(clippy::result_large_err)]
pub fn parse(code: &str) -> Result<Program, Error> {
    let tokens = tokenize(code, LexerOptions::default())
        .map_err(|e| Error::from_error(code, InnerError::Lexer(e)))?;
    AstParser::new(tokens.iter())
        .parse()
        .map_err(|e| Error::from_error(code, InnerError::Parse(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::lambda("lambda x: x + 1", true)]
    #[case::surrounded_by_comments("# header\n\nlambda x: x\n# trailer\n", true)]
    #[case::two_statements("x = 1\nlambda x: x", false)]
    #[case::empty("", false)]
    #[case::unterminated("'abc", false)]
    fn test_parse(#[case] code: &str, #[case] ok: bool) {
        assert_eq!(parse(code).is_ok(), ok);
    }

    #[test]
    fn test_parse_error_is_diagnostic() {
        let err = parse("lambda x: (x +").unwrap_err();
        assert_eq!(err.source_code, "lambda x: (x +");
        assert!(matches!(err.cause, InnerError::Parse(_)));
    }
}
