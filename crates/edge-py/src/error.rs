use std::io;
use std::path::PathBuf;

use miette::{Diagnostic, LabeledSpan, SourceSpan};

/// An error raised by the script runtime, either while evaluating a script or
/// while calling the function it produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ScriptError {
    /// The runtime's own rendering of the error, e.g. `ZeroDivisionError: division by zero`.
    pub message: String,
    /// Stable code reported by the runtime, if it has one.
    pub code: Option<String>,
    /// The file path of a file-backed script, otherwise `<inline>`.
    pub script_name: String,
    pub source_code: String,
    pub location: Option<SourceSpan>,
}

impl ScriptError {
    pub fn new(message: impl Into<String>, script_name: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            script_name: script_name.into(),
            source_code: source_code.into(),
            location: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_location(mut self, location: SourceSpan) -> Self {
        self.location = Some(location);
        self
    }
}

impl Diagnostic for ScriptError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.code
            .as_deref()
            .map(|code| Box::new(code) as Box<dyn std::fmt::Display + 'a>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.location.map(|location| {
            Box::new(std::iter::once(LabeledSpan::new_with_span(
                Some(format!("raised in {}", self.script_name)),
                location,
            ))) as Box<dyn Iterator<Item = LabeledSpan>>
        })
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.location.map(|_| &self.source_code as &dyn miette::SourceCode)
    }
}

/// Errors raised synchronously by the compile entry points.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid compile request: {0}")]
    InvalidRequest(String),
    #[error("Failed to read script file `{}`", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "The Python code must evaluate to a Python lambda expression that takes one parameter, e.g. `lambda x: x + 1`, but it evaluated to {found}"
    )]
    InvalidShape { found: String },
    #[error(transparent)]
    ScriptEvaluation(ScriptError),
    #[error("Failed to start the invocation worker")]
    WorkerSpawn(#[source] io::Error),
}

impl Diagnostic for CompileError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match self {
            CompileError::InvalidRequest(_) => "CompileError::InvalidRequest",
            CompileError::SourceRead { .. } => "CompileError::SourceRead",
            CompileError::InvalidShape { .. } => "CompileError::InvalidShape",
            CompileError::ScriptEvaluation(_) => "CompileError::ScriptEvaluation",
            CompileError::WorkerSpawn(_) => "CompileError::WorkerSpawn",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match self {
            CompileError::InvalidRequest(_) => {
                Some("Pass a record such as {\"source\": \"lambda x: x + 1\", \"sync\": true}.")
            }
            CompileError::SourceRead { .. } => {
                Some("Sources ending in `.py` are read from disk. Check that the path exists and is readable.")
            }
            CompileError::InvalidShape { .. } => Some("Make the last expression of the script a one-argument lambda."),
            CompileError::ScriptEvaluation(_) | CompileError::WorkerSpawn(_) => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            CompileError::ScriptEvaluation(err) => err.labels(),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            CompileError::ScriptEvaluation(err) => err.source_code(),
            _ => None,
        }
    }
}

/// Errors delivered through a [`crate::Deferred`] for a single invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvocationError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("The invocation was abandoned before it completed")]
    Abandoned,
    #[error("The invocation worker is no longer running")]
    WorkerUnavailable,
}

impl Diagnostic for InvocationError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            InvocationError::Script(err) => err.code(),
            InvocationError::Abandoned => Some(Box::new("InvocationError::Abandoned") as Box<dyn std::fmt::Display>),
            InvocationError::WorkerUnavailable => {
                Some(Box::new("InvocationError::WorkerUnavailable") as Box<dyn std::fmt::Display>)
            }
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            InvocationError::Script(err) => err.labels(),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            InvocationError::Script(err) => err.source_code(),
            _ => None,
        }
    }
}
