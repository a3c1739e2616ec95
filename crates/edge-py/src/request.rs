use serde::Deserialize;

use crate::error::CompileError;
use crate::source;

/// Name given to scripts that are not read from a file.
pub const INLINE_SCRIPT_NAME: &str = "<inline>";

/// What to compile and how the resulting function is invoked.
///
/// Deserializes from a record such as `{"source": "lambda x: x + 1", "sync": true}`.
/// `sync` defaults to `false`; unrecognized keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileRequest {
    source: String,
    #[serde(default)]
    sync: bool,
}

impl CompileRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sync: false,
        }
    }

    /// Run invocations on the calling thread instead of a worker thread.
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, CompileError> {
        serde_json::from_value(value).map_err(|e| CompileError::InvalidRequest(e.to_string()))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_sync(&self) -> bool {
        self.sync
    }

    pub fn is_file(&self) -> bool {
        source::is_script_path(&self.source)
    }

    /// The file path for file-backed scripts, otherwise `<inline>`.
    pub fn script_name(&self) -> &str {
        if self.is_file() {
            &self.source
        } else {
            INLINE_SCRIPT_NAME
        }
    }
}

impl TryFrom<serde_json::Value> for CompileRequest {
    type Error = CompileError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Tuning for the bundled interpreter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Overrides the interpreter's default limit on nested lambda calls.
    pub max_call_depth: Option<u32>,
    /// Overrides the interpreter's default limit on nested expressions.
    pub max_nesting_depth: Option<u32>,
}
