//! The in-flight request shared by the non-blocking completion styles
//!
//! A dispatch is spawned as one tokio task. Its terminal state is a single
//! atomic that moves from pending to either completed or cancelled, never
//! both, so each dispatch yields at most one result. Cancelling aborts the
//! task, which drops the transport future and with it the HTTP exchange.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};

use crate::error::{Error, Result};

const PENDING: u8 = 0;
const COMPLETED: u8 = 1;
const CANCELLED: u8 = 2;

/// Cancels an in-flight dispatch
///
/// Handles are cheap to clone and may be sent to other threads. Dropping a
/// handle does not cancel anything.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    state: Arc<AtomicU8>,
    abort: Option<AbortHandle>,
}

impl CancelHandle {
    pub(crate) fn completed() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(COMPLETED)),
            abort: None,
        }
    }

    /// Cancel the dispatch
    ///
    /// Returns `true` if this call cancelled it. Once a result has been
    /// produced, or the dispatch was already cancelled, this does nothing and
    /// returns `false`.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            if let Some(abort) = &self.abort {
                abort.abort();
            }
            tracing::debug!("request cancelled");
        }
        cancelled
    }

    /// Check if the dispatch was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Check if the dispatch produced its result
    pub fn is_completed(&self) -> bool {
        self.state.load(Ordering::Acquire) == COMPLETED
    }
}

/// A dispatched request whose result has not been consumed yet
///
/// The request starts running as soon as it is dispatched; awaiting only
/// collects the result. Resolves to [`Error::Cancelled`] if the dispatch was
/// cancelled through a [`CancelHandle`]. Dropping an unfinished
/// `PendingRequest` cancels the dispatch.
#[must_use = "dropping a PendingRequest cancels it"]
#[derive(Debug)]
pub struct PendingRequest<T> {
    join: Option<JoinHandle<Option<Result<T>>>>,
    failed: Option<Error>,
    cancel: CancelHandle,
}

impl<T> PendingRequest<T>
where
    T: Send + 'static,
{
    /// Spawn `future` on `runtime`
    pub(crate) fn spawn<F>(runtime: &Handle, future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = state.clone();
        let join = runtime.spawn(async move {
            let result = future.await;
            task_state
                .compare_exchange(PENDING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
                .then_some(result)
        });
        let cancel = CancelHandle {
            state,
            abort: Some(join.abort_handle()),
        };

        Self {
            join: Some(join),
            failed: None,
            cancel,
        }
    }

    /// A dispatch that failed before it could start
    pub(crate) fn failed(error: Error) -> Self {
        Self {
            join: None,
            failed: Some(error),
            cancel: CancelHandle::completed(),
        }
    }
}

impl<T> PendingRequest<T> {
    /// Get a handle that can cancel this dispatch from elsewhere
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Cancel the dispatch, see [`CancelHandle::cancel`]
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Check if the result has already been consumed
    pub(crate) fn is_terminated(&self) -> bool {
        self.join.is_none() && self.failed.is_none()
    }
}

impl<T> Future for PendingRequest<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(error) = this.failed.take() {
            return Poll::Ready(Err(error));
        }
        let join = match this.join.as_mut() {
            Some(join) => join,
            None => panic!("PendingRequest polled after completion"),
        };

        let output = ready!(Pin::new(join).poll(cx));
        this.join = None;

        Poll::Ready(match output {
            Ok(Some(result)) => result,
            Ok(None) => Err(Error::Cancelled),
            Err(e) if e.is_cancelled() => Err(Error::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        })
    }
}

impl<T> Drop for PendingRequest<T> {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.cancel.cancel();
        }
    }
}
