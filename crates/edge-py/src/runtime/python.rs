use std::ffi::CString;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};
use tracing::trace;

use super::{Evaluated, ScriptRuntime};
use crate::error::ScriptError;

/// Runs scripts on an embedded CPython interpreter.
///
/// Values cross the boundary as JSON text through Python's `json` module.
#[derive(Debug, Default)]
pub struct PythonRuntime {
    script_name: String,
    source_code: String,
}

impl PythonRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn script_error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::new(message, self.script_name.as_str(), self.source_code.as_str())
    }

    fn py_error(&self, py: Python<'_>, err: PyErr) -> ScriptError {
        let code = err.get_type(py).name().map(|name| name.to_string()).ok();
        let mut script_error = self.script_error(err.to_string());
        script_error.code = code;
        script_error
    }
}

impl ScriptRuntime for PythonRuntime {
    type Callable = Py<PyAny>;

    fn evaluate(&mut self, source: &str, script_name: &str) -> Result<Evaluated<Py<PyAny>>, ScriptError> {
        self.script_name = script_name.to_string();
        self.source_code = source.to_string();

        let code = CString::new(source.trim_end()).map_err(|e| self.script_error(e.to_string()))?;
        Python::attach(|py| {
            let globals = PyDict::new(py);
            let value = py
                .eval(&code, Some(&globals), None)
                .map_err(|e| self.py_error(py, e))?;
            trace!(script = %script_name, "Evaluated script");

            match parameter_count(&value) {
                Some(1) => Ok(Evaluated::Callable(value.unbind())),
                Some(n) => Ok(Evaluated::NotCallable(format!("a function taking {} parameters", n))),
                None => Ok(Evaluated::NotCallable(
                    value
                        .repr()
                        .map(|repr| repr.to_string())
                        .unwrap_or_else(|_| "an object".to_string()),
                )),
            }
        })
    }

    fn invoke(&mut self, callable: &Py<PyAny>, input: serde_json::Value) -> Result<serde_json::Value, ScriptError> {
        Python::attach(|py| {
            let json = PyModule::import(py, "json").map_err(|e| self.py_error(py, e))?;
            let arg = json
                .call_method1("loads", (input.to_string(),))
                .map_err(|e| self.py_error(py, e))?;
            let output = callable.bind(py).call1((arg,)).map_err(|e| self.py_error(py, e))?;

            let kwargs = PyDict::new(py);
            kwargs
                .set_item("allow_nan", false)
                .map_err(|e| self.py_error(py, e))?;
            let dumped = json
                .call_method("dumps", (output,), Some(&kwargs))
                .and_then(|dumped| dumped.extract::<String>().map_err(PyErr::from))
                .map_err(|e| self.py_error(py, e))?;

            serde_json::from_str(&dumped).map_err(|e| self.script_error(e.to_string()))
        })
    }
}

/// Number of positional parameters of a Python function, `None` for anything else.
fn parameter_count(value: &Bound<'_, PyAny>) -> Option<usize> {
    value
        .getattr("__code__")
        .and_then(|code| code.getattr("co_argcount"))
        .and_then(|count| count.extract::<usize>().map_err(PyErr::from))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn compile(runtime: &mut PythonRuntime, source: &str) -> Py<PyAny> {
        match runtime.evaluate(source, "<inline>").unwrap() {
            Evaluated::Callable(func) => func,
            Evaluated::NotCallable(found) => panic!("not callable: {}", found),
        }
    }

    #[rstest]
    #[case::increment("lambda x: x + 1", json!(41), json!(42))]
    #[case::record("lambda p: {'total': sum(p['values'])}", json!({"values": [1, 2, 3]}), json!({"total": 6}))]
    #[case::string("lambda s: s.upper()", json!("abc"), json!("ABC"))]
    fn test_invoke(#[case] source: &str, #[case] input: serde_json::Value, #[case] expected: serde_json::Value) {
        let mut runtime = PythonRuntime::new();
        let func = compile(&mut runtime, source);
        assert_eq!(runtime.invoke(&func, input), Ok(expected));
    }

    #[rstest]
    #[case::number("42")]
    #[case::two_params("lambda a, b: a")]
    #[case::builtin("len")]
    fn test_not_callable(#[case] source: &str) {
        let mut runtime = PythonRuntime::new();
        assert!(matches!(
            runtime.evaluate(source, "<inline>"),
            Ok(Evaluated::NotCallable(_))
        ));
    }

    #[rstest]
    #[case::leading_comment("# doubles\nlambda x: x * 2\n\n")]
    #[case::trailing_indent("lambda x: x * 2\n    ")]
    fn test_surrounding_lines(#[case] source: &str) {
        let mut runtime = PythonRuntime::new();
        let func = compile(&mut runtime, source);
        assert_eq!(runtime.invoke(&func, json!(21)), Ok(json!(42)));
    }

    #[test]
    fn test_indented_script_rejected() {
        let mut runtime = PythonRuntime::new();
        match runtime.evaluate("  lambda x: x", "<inline>") {
            Err(err) => assert_eq!(err.code.as_deref(), Some("IndentationError")),
            Ok(_) => panic!("indented script evaluated"),
        }
    }

    #[test]
    fn test_invoke_error() {
        let mut runtime = PythonRuntime::new();
        let func = compile(&mut runtime, "lambda x: x / 0");
        let err = runtime.invoke(&func, json!(41)).unwrap_err();
        assert_eq!(err.code.as_deref(), Some("ZeroDivisionError"));
        assert!(err.message.contains("division by zero"));
    }
}
