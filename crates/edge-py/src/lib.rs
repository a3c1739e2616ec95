//! `edge-py` turns a Python lambda script into a function the host can call.
//!
//! A script is either inline code, which may be indented to line up with the
//! surrounding host text, or a path to a `.py` file. It is evaluated once and
//! must produce a one-argument lambda. The resulting [`InvocationWrapper`] is
//! then called once per input and hands back a [`Deferred`] result.
//!
//! ## Examples
//!
//! ```rust
//! use edge_py::{CompileRequest, Status, compile_func, compile_func_from_value};
//! use serde_json::json;
//!
//! // Runs on the calling thread and completes immediately.
//! let sync = compile_func(CompileRequest::new("lambda x: x + 1").sync(true)).unwrap();
//! let deferred = sync.invoke(json!(41));
//! assert_eq!(deferred.status(), Status::Resolved);
//! assert_eq!(deferred.wait(), Ok(json!(42)));
//!
//! // Runs on a worker thread; the deferred can be waited on or awaited.
//! let wrapper = compile_func_from_value(json!({"source": "lambda p: p['n'] * 2"})).unwrap();
//! assert_eq!(wrapper.invoke(json!({"n": 21})).wait(), Ok(json!(42)));
//! ```
mod compiler;
mod deferred;
mod error;
mod request;
mod runtime;
mod source;
mod wrapper;

pub use compiler::{compile_func, compile_func_from_value, compile_func_with};
pub use deferred::{Deferred, Outcome, Status};
pub use error::{CompileError, InvocationError, ScriptError};
pub use request::{CompileOptions, CompileRequest, INLINE_SCRIPT_NAME};
#[cfg(feature = "python")]
pub use runtime::PythonRuntime;
pub use runtime::{Evaluated, LangRuntime, ScriptRuntime};
pub use source::{SCRIPT_EXTENSION, dedent, is_script_path, normalize};
pub use wrapper::InvocationWrapper;
