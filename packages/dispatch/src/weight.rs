//! Queue weighting for flexible selection.

use std::time::Duration;

use trade_core::QueueKind;

use crate::config::QueueSettings;

/// Scores a queue head; higher means more preferred.
///
/// Weights only break ties between queues whose heads share a priority.
pub trait Weigher: Send + Sync {
    /// `depth` is the number of jobs in the queue, `wait` how long its head
    /// job has been queued.
    fn weight(&self, depth: usize, wait: Duration, kind: QueueKind) -> i64;
}

impl Weigher for QueueSettings {
    fn weight(&self, depth: usize, wait: Duration, kind: QueueKind) -> i64 {
        let bias = self.bias(kind);
        let depth = i64::try_from(depth).unwrap_or(i64::MAX);
        let seconds = i64::try_from(wait.as_secs()).unwrap_or(i64::MAX);
        bias.count
            .saturating_mul(depth)
            .saturating_add(bias.wait.saturating_mul(seconds))
    }
}

/// A closure-backed weigher.
pub struct FnWeigher<F>
where
    F: Fn(usize, Duration, QueueKind) -> i64 + Send + Sync,
{
    weigh: F,
}

impl<F> FnWeigher<F>
where
    F: Fn(usize, Duration, QueueKind) -> i64 + Send + Sync,
{
    pub fn new(weigh: F) -> Self {
        Self { weigh }
    }
}

impl<F> Weigher for FnWeigher<F>
where
    F: Fn(usize, Duration, QueueKind) -> i64 + Send + Sync,
{
    fn weight(&self, depth: usize, wait: Duration, kind: QueueKind) -> i64 {
        (self.weigh)(depth, wait, kind)
    }
}
