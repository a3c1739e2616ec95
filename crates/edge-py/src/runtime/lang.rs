use edge_py_lang::{Engine, Value};
use miette::Diagnostic;
use tracing::trace;

use super::{Evaluated, ScriptRuntime};
use crate::error::ScriptError;
use crate::request::CompileOptions;

/// Runs scripts on the bundled `edge-py-lang` interpreter.
#[derive(Debug, Clone)]
pub struct LangRuntime {
    engine: Engine,
    script_name: String,
    source_code: String,
}

impl Default for LangRuntime {
    fn default() -> Self {
        Self::with_options(&CompileOptions::default())
    }
}

impl LangRuntime {
    pub fn with_options(options: &CompileOptions) -> Self {
        let mut engine = Engine::default();
        if let Some(max_call_depth) = options.max_call_depth {
            engine.set_max_call_depth(max_call_depth);
        }
        if let Some(max_nesting_depth) = options.max_nesting_depth {
            engine.set_max_nesting_depth(max_nesting_depth);
        }

        Self {
            engine,
            script_name: String::new(),
            source_code: String::new(),
        }
    }

    fn script_error(&self, err: edge_py_lang::Error) -> ScriptError {
        let code = err.code().map(|code| code.to_string());
        let mut script_error =
            ScriptError::new(err.to_string(), self.script_name.as_str(), err.source_code.as_str())
                .with_location(err.location);
        script_error.code = code;
        script_error
    }
}

impl ScriptRuntime for LangRuntime {
    type Callable = Value;

    fn evaluate(&mut self, source: &str, script_name: &str) -> Result<Evaluated<Value>, ScriptError> {
        self.script_name = script_name.to_string();
        self.source_code = source.to_string();

        let value = self.engine.eval(source).map_err(|e| self.script_error(e))?;
        trace!(script = %script_name, value = %value.repr(), "Evaluated script");

        match self.engine.arity(&value) {
            Some(1) => Ok(Evaluated::Callable(value)),
            Some(n) => Ok(Evaluated::NotCallable(format!("a lambda taking {} parameters", n))),
            None => Ok(Evaluated::NotCallable(format!("{} {}", value.type_name(), value.repr()))),
        }
    }

    fn invoke(&mut self, callable: &Value, input: serde_json::Value) -> Result<serde_json::Value, ScriptError> {
        let output = self
            .engine
            .call(callable, vec![Value::from(input)])
            .map_err(|e| self.script_error(e))?;

        serde_json::Value::try_from(output)
            .map_err(|e| ScriptError::new(e.to_string(), self.script_name.as_str(), self.source_code.as_str()))
    }
}
