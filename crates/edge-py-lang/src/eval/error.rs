use smol_str::SmolStr;
use thiserror::Error;

use crate::range::Range;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum EvalError {
    #[error("ZeroDivisionError: {1}")]
    ZeroDivision(Range, &'static str),
    #[error("TypeError: {1}")]
    TypeError(Range, String),
    #[error("NameError: name '{1}' is not defined")]
    NameError(Range, SmolStr),
    #[error("IndexError: {1}")]
    IndexError(Range, String),
    #[error("KeyError: {1}")]
    KeyError(Range, String),
    #[error("ValueError: {1}")]
    ValueError(Range, String),
    #[error("AttributeError: {1}")]
    AttributeError(Range, String),
    #[error("OverflowError: {1}")]
    OverflowError(Range, String),
    #[error("RecursionError: maximum recursion depth exceeded ({1})")]
    RecursionError(Range, u32),
}

impl EvalError {
    #[cold]
    pub fn range(&self) -> &Range {
        match self {
            EvalError::ZeroDivision(range, _)
            | EvalError::TypeError(range, _)
            | EvalError::NameError(range, _)
            | EvalError::IndexError(range, _)
            | EvalError::KeyError(range, _)
            | EvalError::ValueError(range, _)
            | EvalError::AttributeError(range, _)
            | EvalError::OverflowError(range, _)
            | EvalError::RecursionError(range, _) => range,
        }
    }

    /// The exception class name as a script author would see it.
    pub fn name(&self) -> &'static str {
        match self {
            EvalError::ZeroDivision(..) => "ZeroDivisionError",
            EvalError::TypeError(..) => "TypeError",
            EvalError::NameError(..) => "NameError",
            EvalError::IndexError(..) => "IndexError",
            EvalError::KeyError(..) => "KeyError",
            EvalError::ValueError(..) => "ValueError",
            EvalError::AttributeError(..) => "AttributeError",
            EvalError::OverflowError(..) => "OverflowError",
            EvalError::RecursionError(..) => "RecursionError",
        }
    }
}
