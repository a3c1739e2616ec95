use std::sync::Arc;

use smol_str::SmolStr;

use crate::{
    Value,
    error::{self, InnerError},
    eval::{self, Evaluator, env::Env},
    parse,
    range::Range,
};

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub eval: eval::Options,
}

/// Evaluates scripts and calls the values they produce.
///
/// Values defined through [`Engine::define_value`] are visible to every
/// script evaluated afterwards.
#[derive(Debug, Clone)]
pub struct Engine {
    pub(crate) evaluator: Evaluator,
    globals: Arc<Env>,
    source_code: String,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Engine {
    pub fn new(options: Options) -> Self {
        Self {
            evaluator: Evaluator::new(options.eval),
            globals: Arc::new(Env::default()),
            source_code: String::new(),
        }
    }

    pub fn set_max_call_depth(&mut self, max_call_depth: u32) {
        self.evaluator.options.max_call_depth = max_call_depth;
    }

    pub fn set_max_nesting_depth(&mut self, max_nesting_depth: u32) {
        self.evaluator.options.max_nesting_depth = max_nesting_depth;
    }

    pub fn define_value(&mut self, name: &str, value: Value) {
        Arc::make_mut(&mut self.globals).define(SmolStr::new(name), value);
    }

    #[allow(clippy::result_large_err)]
    pub fn eval(&mut self, code: &str) -> Result<Value, error::Error> {
        let program = parse(code)?;
        self.source_code = code.to_string();
        self.evaluator
            .eval(&program, &self.globals)
            .map_err(|e| error::Error::from_error(code, InnerError::Eval(e)))
    }

    /// Calls `callee` with positional `args`.
    ///
    /// Errors point into the source of the most recent [`Engine::eval`] call,
    /// which is where any lambda handed back to the host was defined.
    #[allow(clippy::result_large_err)]
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, error::Error> {
        let range = match callee {
            Value::Function(function) => function.def.range,
            _ => Range::default(),
        };
        self.evaluator
            .call_value(callee, args, &range)
            .map_err(|e| error::Error::from_error(self.source_code.as_str(), InnerError::Eval(e)))
    }

    /// Number of positional parameters `value` takes, if it is a lambda.
    pub fn arity(&self, value: &Value) -> Option<usize> {
        value.arity()
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_engine_default() {
        let engine = Engine::default();
        assert_eq!(engine.evaluator.options.max_call_depth, eval::Options::default().max_call_depth);
    }

    #[test]
    fn test_set_max_call_depth() {
        let mut engine = Engine::default();
        engine.set_max_call_depth(2);

        let err = engine
            .eval("(lambda f: f(f))(lambda g: g(g))")
            .unwrap_err();
        assert!(matches!(err.cause, InnerError::Eval(eval::error::EvalError::RecursionError(_, 2))));
    }

    #[test]
    fn test_define_value() {
        let mut engine = Engine::default();
        engine.define_value("offset", Value::Int(10));

        let func = engine.eval("lambda x: x + offset").unwrap();
        assert_eq!(engine.call(&func, vec![Value::Int(1)]), Ok(Value::Int(11)));
    }

    #[rstest]
    #[case::lambda("lambda x: x", Some(1))]
    #[case::two_params("lambda a, b: a", Some(2))]
    #[case::no_params("lambda: 0", Some(0))]
    #[case::int("42", None)]
    #[case::builtin("len", None)]
    fn test_arity(#[case] code: &str, #[case] expected: Option<usize>) {
        let mut engine = Engine::default();
        let value = engine.eval(code).unwrap();
        assert_eq!(engine.arity(&value), expected);
    }

    #[test]
    fn test_call_error_points_into_source() {
        let mut engine = Engine::default();
        let code = "lambda x: x / 0";
        let func = engine.eval(code).unwrap();

        let err = engine.call(&func, vec![Value::Int(41)]).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
        assert_eq!(err.source_code, code);
    }

    #[test]
    fn test_call_builtin() {
        let mut engine = Engine::default();
        let len = engine.eval("len").unwrap();
        assert_eq!(
            engine.call(&len, vec![Value::String("abc".to_string())]),
            Ok(Value::Int(3))
        );
    }

    #[test]
    fn test_version() {
        assert_eq!(Engine::version(), env!("CARGO_PKG_VERSION"));
    }
}
