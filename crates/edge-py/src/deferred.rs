use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use tracing::warn;

use crate::error::InvocationError;

pub type Outcome = Result<serde_json::Value, InvocationError>;

type Continuation = Box<dyn FnOnce(&Outcome) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Resolved,
    Failed,
}

#[derive(Default)]
struct State {
    outcome: Option<Outcome>,
    wakers: Vec<Waker>,
    continuations: Vec<Continuation>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    completed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The eventual result of one invocation.
///
/// A `Deferred` can be polled with [`Deferred::status`] and
/// [`Deferred::try_result`], blocked on with [`Deferred::wait`], awaited as a
/// [`Future`], or observed with a continuation through [`Deferred::on_complete`].
/// Clones observe the same result.
#[derive(Clone)]
pub struct Deferred {
    shared: Arc<Shared>,
}

/// The producing side of a pending [`Deferred`].
///
/// Dropping a completer without calling [`Completer::complete`] fails the
/// deferred with [`InvocationError::Abandoned`].
pub(crate) struct Completer {
    shared: Option<Arc<Shared>>,
}

impl Deferred {
    pub(crate) fn pending() -> (Deferred, Completer) {
        let shared = Arc::new(Shared::default());
        (
            Deferred {
                shared: Arc::clone(&shared),
            },
            Completer { shared: Some(shared) },
        )
    }

    pub fn completed(outcome: Outcome) -> Deferred {
        let (deferred, completer) = Deferred::pending();
        completer.complete(outcome);
        deferred
    }

    pub fn resolved(value: serde_json::Value) -> Deferred {
        Deferred::completed(Ok(value))
    }

    pub fn failed(error: InvocationError) -> Deferred {
        Deferred::completed(Err(error))
    }

    pub fn status(&self) -> Status {
        match &self.shared.lock().outcome {
            None => Status::Pending,
            Some(Ok(_)) => Status::Resolved,
            Some(Err(_)) => Status::Failed,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == Status::Pending
    }

    /// The result, if the invocation has finished.
    pub fn try_result(&self) -> Option<Outcome> {
        self.shared.lock().outcome.clone()
    }

    /// Blocks the current thread until the invocation finishes.
    pub fn wait(&self) -> Outcome {
        let mut state = self.shared.lock();
        loop {
            if let Some(outcome) = &state.outcome {
                return outcome.clone();
            }
            state = self
                .shared
                .completed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Registers `f` to run once with the result.
    ///
    /// If the invocation already finished, `f` runs immediately on the calling
    /// thread; otherwise it runs on the thread that completes the invocation.
    pub fn on_complete<F>(&self, f: F)
    where
        F: FnOnce(&Outcome) + Send + 'static,
    {
        let mut state = self.shared.lock();
        let outcome = state.outcome.clone();
        match outcome {
            Some(outcome) => {
                drop(state);
                f(&outcome);
            }
            None => state.continuations.push(Box::new(f)),
        }
    }
}

impl Debug for Deferred {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("outcome", &self.shared.lock().outcome)
            .finish()
    }
}

impl Future for Deferred {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.lock();
        match &state.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                if !state.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                    state.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl Completer {
    pub(crate) fn complete(mut self, outcome: Outcome) {
        if let Some(shared) = self.shared.take() {
            finish(&shared, outcome);
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            warn!("Invocation dropped before completion");
            finish(&shared, Err(InvocationError::Abandoned));
        }
    }
}

fn finish(shared: &Shared, outcome: Outcome) {
    let (wakers, continuations) = {
        let mut state = shared.lock();
        state.outcome = Some(outcome.clone());
        (
            std::mem::take(&mut state.wakers),
            std::mem::take(&mut state.continuations),
        )
    };
    shared.completed.notify_all();

    for waker in wakers {
        waker.wake();
    }
    for continuation in continuations {
        continuation(&outcome);
    }
}
