//! The seam between the compiler and the interpreter that runs scripts.
mod lang;
#[cfg(feature = "python")]
mod python;

pub use lang::LangRuntime;
#[cfg(feature = "python")]
pub use python::PythonRuntime;

use crate::error::ScriptError;

/// Result of evaluating a script: either a one-argument function or a
/// description of whatever else it produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated<C> {
    Callable(C),
    NotCallable(String),
}

/// An interpreter able to evaluate a script once and then call the function it
/// produced any number of times.
pub trait ScriptRuntime {
    type Callable;

    /// Evaluates `source` in a fresh context. `script_name` is used in diagnostics.
    fn evaluate(&mut self, source: &str, script_name: &str) -> Result<Evaluated<Self::Callable>, ScriptError>;

    /// Calls `callable` with `input` as its only argument.
    fn invoke(&mut self, callable: &Self::Callable, input: serde_json::Value) -> Result<serde_json::Value, ScriptError>;
}
