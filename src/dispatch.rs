//! Async dispatch bridge.
//!
//! Turns a blocking synchronous operation (an HTTP round trip plus
//! response parsing) into a future without blocking the caller. The work
//! is posted to tokio's blocking thread pool; [`Dispatcher::dispatch`]
//! itself returns immediately.
//!
//! Guarantees:
//! - the work closure executes at most once;
//! - its `Ok`/`Err` outcome is delivered to the future exactly once, no
//!   matter how often the future is polled;
//! - a panic inside the work surfaces as
//!   [`ExchangeError::DispatchInternal`], never a silent drop.
//!
//! Cancellation: dropping the future detaches the task. Once the work has
//! started it runs to completion, since the underlying HTTP call is not
//! preemptible. No ordering is guaranteed between concurrently dispatched
//! operations; callers needing sequencing must await one future before
//! issuing the next (several venues rate-limit per key and expect
//! client-side pacing).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::ExchangeError;

/// Schedules blocking work on a tokio runtime's blocking pool.
///
/// One dispatcher is shared by all operations of a client instance; it
/// holds only a runtime handle and is cheap to clone.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    handle: Handle,
}

impl Dispatcher {
    /// Create a dispatcher bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`Dispatcher::from_handle`] in that case.
    pub fn new() -> Self {
        Self {
            handle: Handle::current(),
        }
    }

    /// Create a dispatcher bound to an explicit runtime handle.
    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }

    /// Schedule `work` for execution and return a future for its outcome.
    ///
    /// Never blocks and never raises synchronously: every error produced
    /// by `work`, including a panic, arrives through the returned future.
    pub fn dispatch<T, F>(&self, work: F) -> DispatchFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ExchangeError> + Send + 'static,
    {
        debug!("dispatching blocking operation");
        DispatchFuture {
            join: self.handle.spawn_blocking(work),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Future for one dispatched operation.
///
/// Resolves exactly once with the work's result. Dropping it before
/// completion detaches the operation (see module docs for the cancellation
/// contract).
pub struct DispatchFuture<T> {
    join: JoinHandle<Result<T, ExchangeError>>,
}

impl<T> Future for DispatchFuture<T> {
    type Output = Result<T, ExchangeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.join).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(join_error)) => {
                // A panic in the work or a torn-down pool; both are
                // programming-error class.
                error!(%join_error, "dispatched operation failed to complete");
                let message = if join_error.is_panic() {
                    format!("dispatched operation panicked: {join_error}")
                } else {
                    format!("dispatched operation was aborted: {join_error}")
                };
                Poll::Ready(Err(ExchangeError::DispatchInternal(message)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_work_executes_exactly_once() {
        let dispatcher = Dispatcher::new();
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let value = dispatcher
            .dispatch(move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_delivered_through_future() {
        let dispatcher = Dispatcher::new();

        let result: Result<(), _> = dispatcher
            .dispatch(|| Err(ExchangeError::InvalidResponse("boom".to_string())))
            .await;

        assert!(matches!(result, Err(ExchangeError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_panic_becomes_dispatch_internal() {
        let dispatcher = Dispatcher::new();

        let result: Result<(), _> = dispatcher.dispatch(|| panic!("bookkeeping bug")).await;

        assert!(matches!(result, Err(ExchangeError::DispatchInternal(_))));
    }

    #[tokio::test]
    async fn test_dispatch_returns_before_work_completes() {
        let dispatcher = Dispatcher::new();

        let started = Instant::now();
        let future = dispatcher.dispatch(|| {
            std::thread::sleep(Duration::from_millis(50));
            Ok(42)
        });
        let dispatch_elapsed = started.elapsed();

        let value = future.await.unwrap();
        let total_elapsed = started.elapsed();

        assert_eq!(value, 42);
        // Scheduling is effectively instantaneous; the sleep happens on the
        // blocking pool, not in the caller.
        assert!(dispatch_elapsed < Duration::from_millis(10));
        assert!(total_elapsed >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_all_resolve() {
        let dispatcher = Dispatcher::new();
        let counter = Arc::new(AtomicU32::new(0));

        let futures: Vec<_> = (0..16)
            .map(|i| {
                let c = counter.clone();
                dispatcher.dispatch(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(i)
                })
            })
            .collect();

        let mut sum = 0;
        for future in futures {
            sum += future.await.unwrap();
        }

        assert_eq!(sum, (0..16).sum::<u32>());
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }
}
