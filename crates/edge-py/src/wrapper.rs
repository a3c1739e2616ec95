use std::io;
use std::sync::{Mutex, PoisonError};
use std::thread;

use crossbeam_channel::{Receiver, SendError, Sender};
use tracing::{debug, trace, warn};

use crate::deferred::{Completer, Deferred};
use crate::error::{InvocationError, ScriptError};
use crate::runtime::ScriptRuntime;

const WORKER_THREAD_NAME: &str = "edge-py-worker";

type Job = (serde_json::Value, Completer);

/// A compiled callable together with the runtime that produced it.
pub(crate) trait Invoke: Send {
    fn invoke(&mut self, input: serde_json::Value) -> Result<serde_json::Value, ScriptError>;
}

pub(crate) struct Bound<R: ScriptRuntime> {
    runtime: R,
    callable: R::Callable,
}

impl<R: ScriptRuntime> Bound<R> {
    pub(crate) fn new(runtime: R, callable: R::Callable) -> Self {
        Self { runtime, callable }
    }
}

impl<R> Invoke for Bound<R>
where
    R: ScriptRuntime + Send,
    R::Callable: Send,
{
    fn invoke(&mut self, input: serde_json::Value) -> Result<serde_json::Value, ScriptError> {
        self.runtime.invoke(&self.callable, input)
    }
}

enum Mode {
    Sync(Mutex<Box<dyn Invoke>>),
    Async(Sender<Job>),
}

/// A compiled script function, invoked once per input value.
///
/// In sync mode [`InvocationWrapper::invoke`] runs the call on the calling
/// thread and returns an already completed [`Deferred`]. In async mode the call
/// is queued to a worker thread owned by the wrapper and the returned
/// [`Deferred`] is pending until the worker reaches it. Either way calls on one
/// wrapper never overlap and run in the order they were made.
///
/// Dropping the wrapper lets the worker finish the calls already queued before
/// it exits.
///
/// In async mode a panic in the runtime kills the worker: calls still pending
/// fail with [`InvocationError::Abandoned`] and later calls with
/// [`InvocationError::WorkerUnavailable`]. This needs unwinding, so a binary
/// built with `panic = "abort"` terminates instead.
pub struct InvocationWrapper {
    mode: Mode,
    script_name: String,
}

impl InvocationWrapper {
    pub(crate) fn sync(bound: Box<dyn Invoke>, script_name: &str) -> Self {
        Self {
            mode: Mode::Sync(Mutex::new(bound)),
            script_name: script_name.to_string(),
        }
    }

    pub(crate) fn spawn(bound: Box<dyn Invoke>, script_name: &str) -> io::Result<Self> {
        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<Job>();
        let worker_script_name = script_name.to_string();

        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(bound, jobs_rx, &worker_script_name))?;

        Ok(Self {
            mode: Mode::Async(jobs_tx),
            script_name: script_name.to_string(),
        })
    }

    pub fn invoke(&self, input: serde_json::Value) -> Deferred {
        match &self.mode {
            Mode::Sync(bound) => {
                trace!(script = %self.script_name, "Invoking script");
                let outcome = bound
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .invoke(input)
                    .map_err(InvocationError::from);
                Deferred::completed(outcome)
            }
            Mode::Async(jobs) => {
                let (deferred, completer) = Deferred::pending();
                if let Err(SendError((_, completer))) = jobs.send((input, completer)) {
                    warn!(script = %self.script_name, "Invocation worker is not running");
                    completer.complete(Err(InvocationError::WorkerUnavailable));
                }
                deferred
            }
        }
    }

    pub fn is_sync(&self) -> bool {
        matches!(self.mode, Mode::Sync(_))
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }
}

impl std::fmt::Debug for InvocationWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationWrapper")
            .field("sync", &self.is_sync())
            .field("script_name", &self.script_name)
            .finish()
    }
}

fn run_worker(mut bound: Box<dyn Invoke>, jobs: Receiver<Job>, script_name: &str) {
    debug!(script = %script_name, "Invocation worker started");

    for (input, completer) in jobs.iter() {
        trace!(script = %script_name, "Invoking script");
        completer.complete(bound.invoke(input).map_err(InvocationError::from));
    }

    debug!(script = %script_name, "Invocation worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::Status;
    use crate::runtime::Evaluated;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Doubles numbers, fails on strings and panics on `null`.
    #[derive(Default)]
    struct Doubler {
        calls: Arc<AtomicUsize>,
    }

    impl ScriptRuntime for Doubler {
        type Callable = i64;

        fn evaluate(&mut self, _source: &str, _script_name: &str) -> Result<Evaluated<i64>, ScriptError> {
            Ok(Evaluated::Callable(2))
        }

        fn invoke(&mut self, factor: &i64, input: serde_json::Value) -> Result<serde_json::Value, ScriptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match input {
                serde_json::Value::Number(n) => Ok(json!(n.as_i64().unwrap_or_default() * factor)),
                serde_json::Value::Null => panic!("null input"),
                other => Err(ScriptError::new(format!("TypeError: {}", other), "<inline>", "")),
            }
        }
    }

    fn bound(calls: &Arc<AtomicUsize>) -> Box<dyn Invoke> {
        Box::new(Bound::new(
            Doubler {
                calls: Arc::clone(calls),
            },
            2,
        ))
    }

    #[test]
    fn test_sync_invoke_is_completed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapper = InvocationWrapper::sync(bound(&calls), "<inline>");

        let deferred = wrapper.invoke(json!(21));
        assert_eq!(deferred.status(), Status::Resolved);
        assert_eq!(deferred.try_result(), Some(Ok(json!(42))));
        assert!(wrapper.is_sync());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sync_invoke_error_is_failed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapper = InvocationWrapper::sync(bound(&calls), "<inline>");

        let deferred = wrapper.invoke(json!("a"));
        assert_eq!(deferred.status(), Status::Failed);
        assert!(matches!(deferred.wait(), Err(InvocationError::Script(_))));
        assert_eq!(wrapper.invoke(json!(1)).wait(), Ok(json!(2)));
    }

    #[test]
    fn test_async_invoke_preserves_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapper = InvocationWrapper::spawn(bound(&calls), "<inline>").unwrap();
        assert!(!wrapper.is_sync());

        let deferreds = (0..50).map(|n| wrapper.invoke(json!(n))).collect::<Vec<_>>();
        for (n, deferred) in deferreds.iter().enumerate() {
            assert_eq!(deferred.wait(), Ok(json!(n * 2)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_dropping_wrapper_drains_queue() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapper = InvocationWrapper::spawn(bound(&calls), "<inline>").unwrap();

        let deferreds = (0..10).map(|n| wrapper.invoke(json!(n))).collect::<Vec<_>>();
        drop(wrapper);

        for deferred in deferreds {
            assert!(deferred.wait().is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_worker_panic_fails_pending_and_later_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapper = InvocationWrapper::spawn(bound(&calls), "<inline>").unwrap();

        assert_eq!(wrapper.invoke(serde_json::Value::Null).wait(), Err(InvocationError::Abandoned));

        let mut later = wrapper.invoke(json!(1)).wait();
        for _ in 0..100 {
            if later == Err(InvocationError::WorkerUnavailable) {
                break;
            }
            assert_eq!(later, Err(InvocationError::Abandoned));
            thread::sleep(Duration::from_millis(10));
            later = wrapper.invoke(json!(1)).wait();
        }
        assert_eq!(later, Err(InvocationError::WorkerUnavailable));
    }
}
