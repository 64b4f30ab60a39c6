//! Observers told about every job handed to a worker.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use trade_core::TradeJob;

/// Result type for observers.
pub type ObserverResult = Result<(), String>;

/// Hook invoked after a job has been handed to a worker.
///
/// Implement this to forward dispatches elsewhere (chat notifications,
/// audit logs). A failure is logged and never undoes the dispatch.
pub trait DispatchObserver<P>: Send + Sync {
    fn on_dispatch(&self, worker_id: &str, job: &TradeJob<P>) -> ObserverResult;
}

/// A simple function-based observer.
pub struct FnObserver<F> {
    name: String,
    observe: F,
}

impl<F> FnObserver<F> {
    pub fn new(name: impl Into<String>, observe: F) -> Self {
        Self {
            name: name.into(),
            observe,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<P, F> DispatchObserver<P> for FnObserver<F>
where
    F: Fn(&str, &TradeJob<P>) -> ObserverResult + Send + Sync,
{
    fn on_dispatch(&self, worker_id: &str, job: &TradeJob<P>) -> ObserverResult {
        (self.observe)(worker_id, job)
    }
}

/// Append-only list of observers, notified in registration order.
pub struct ObserverList<P> {
    observers: RwLock<Vec<Arc<dyn DispatchObserver<P>>>>,
}

impl<P> ObserverList<P> {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn push(&self, observer: Arc<dyn DispatchObserver<P>>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every observer; one failing or panicking does not stop the rest.
    pub fn notify(&self, worker_id: &str, job: &TradeJob<P>) {
        // Snapshot so an observer may register another without deadlocking.
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (index, observer) in observers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer.on_dispatch(worker_id, job))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!("Observer {} failed for job {}: {}", index, job.id, e);
                }
                Err(_) => {
                    tracing::warn!("Observer {} panicked for job {}", index, job.id);
                }
            }
        }
    }
}

impl<P> Default for ObserverList<P> {
    fn default() -> Self {
        Self::new()
    }
}
