use tracing::{debug, warn};

use crate::error::CompileError;
use crate::request::CompileRequest;
use crate::runtime::{Evaluated, LangRuntime, ScriptRuntime};
use crate::source;
use crate::wrapper::{Bound, InvocationWrapper};

/// Compiles `request` with the bundled interpreter.
///
/// ```rust
/// use edge_py::{CompileRequest, compile_func};
/// use serde_json::json;
///
/// let wrapper = compile_func(CompileRequest::new("  lambda x: x + 1").sync(true)).unwrap();
/// assert_eq!(wrapper.invoke(json!(41)).wait(), Ok(json!(42)));
/// ```
pub fn compile_func(request: CompileRequest) -> Result<InvocationWrapper, CompileError> {
    compile_func_with(LangRuntime::default(), request)
}

/// Compiles a request given as a parameter record such as
/// `{"source": "lambda x: x + 1", "sync": true}`.
pub fn compile_func_from_value(value: serde_json::Value) -> Result<InvocationWrapper, CompileError> {
    compile_func(CompileRequest::from_value(value)?)
}

/// Compiles `request` with `runtime`.
///
/// The script is evaluated once. The returned wrapper owns `runtime` and the
/// function the script evaluated to.
pub fn compile_func_with<R>(mut runtime: R, request: CompileRequest) -> Result<InvocationWrapper, CompileError>
where
    R: ScriptRuntime + Send + 'static,
    R::Callable: Send + 'static,
{
    let script_name = request.script_name();
    debug!(script = %script_name, sync = request.is_sync(), "Compiling script");

    let code = source::normalize(request.source())?;
    let callable = match runtime
        .evaluate(&code, script_name)
        .map_err(CompileError::ScriptEvaluation)?
    {
        Evaluated::Callable(callable) => callable,
        Evaluated::NotCallable(found) => {
            warn!(script = %script_name, found = %found, "Script did not evaluate to a one-argument lambda");
            return Err(CompileError::InvalidShape { found });
        }
    };

    let bound = Box::new(Bound::new(runtime, callable));
    let wrapper = if request.is_sync() {
        InvocationWrapper::sync(bound, script_name)
    } else {
        InvocationWrapper::spawn(bound, script_name).map_err(CompileError::WorkerSpawn)?
    };

    debug!(script = %script_name, "Compiled script");
    Ok(wrapper)
}
