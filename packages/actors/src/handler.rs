//! Trade executor trait.

use std::future::Future;
use std::pin::Pin;

use trade_core::TradeJob;

/// What an executor reports about a finished trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeOutcome {
    /// Human-readable summary of the result.
    pub summary: String,
}

impl TradeOutcome {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

/// Result type for trade executors.
pub type ExecResult = Result<TradeOutcome, String>;

/// Future type for async trade executors.
pub type ExecFuture = Pin<Box<dyn Future<Output = ExecResult> + Send>>;

/// Performs a dispatched trade.
///
/// Implement this to drive the console automation; the hub only decides
/// which job runs where.
pub trait TradeExecutor<P>: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run the trade and report how it went.
    fn execute(&self, job: &TradeJob<P>) -> ExecFuture;
}

/// A simple function-based executor.
pub struct FnExecutor<F> {
    name: String,
    execute: F,
}

impl<F> FnExecutor<F> {
    /// Create a new function-based executor.
    pub fn new(name: impl Into<String>, execute: F) -> Self {
        Self {
            name: name.into(),
            execute,
        }
    }
}

impl<P, F> TradeExecutor<P> for FnExecutor<F>
where
    F: Fn(&TradeJob<P>) -> ExecFuture + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, job: &TradeJob<P>) -> ExecFuture {
        (self.execute)(job)
    }
}
