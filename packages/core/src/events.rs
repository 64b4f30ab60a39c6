//! Event types for real-time updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, Priority, QueueKind, RoutineKind, TradeType};

/// Events emitted by the dispatcher and its workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    // Queue events
    /// A job was accepted into a queue.
    JobEnqueued {
        job_id: JobId,
        queue: QueueKind,
        priority: Priority,
        timestamp: DateTime<Utc>,
    },
    /// Every queue was emptied; the jobs were discarded.
    QueuesCleared {
        discarded: usize,
        timestamp: DateTime<Utc>,
    },

    // Dispatch events
    /// A queued job was handed to a worker.
    JobDispatched {
        job_id: JobId,
        queue: QueueKind,
        priority: Priority,
        worker_id: String,
        timestamp: DateTime<Utc>,
    },
    /// An idle worker was given a filler job from the distribution pool.
    IdleDistributed {
        job_id: JobId,
        worker_id: String,
        timestamp: DateTime<Utc>,
    },

    // Trade events
    /// A worker finished a trade.
    TradeCompleted {
        job_id: JobId,
        trade_type: TradeType,
        worker_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A worker gave up on a trade.
    TradeFailed {
        job_id: JobId,
        trade_type: TradeType,
        worker_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    // Worker events
    WorkerStarted {
        worker_id: String,
        routine: RoutineKind,
        timestamp: DateTime<Utc>,
    },
    WorkerStopped {
        worker_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl DispatchEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DispatchEvent::JobEnqueued { timestamp, .. } => *timestamp,
            DispatchEvent::QueuesCleared { timestamp, .. } => *timestamp,
            DispatchEvent::JobDispatched { timestamp, .. } => *timestamp,
            DispatchEvent::IdleDistributed { timestamp, .. } => *timestamp,
            DispatchEvent::TradeCompleted { timestamp, .. } => *timestamp,
            DispatchEvent::TradeFailed { timestamp, .. } => *timestamp,
            DispatchEvent::WorkerStarted { timestamp, .. } => *timestamp,
            DispatchEvent::WorkerStopped { timestamp, .. } => *timestamp,
        }
    }

    /// Get the job ID associated with this event, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            DispatchEvent::JobEnqueued { job_id, .. } => Some(*job_id),
            DispatchEvent::JobDispatched { job_id, .. } => Some(*job_id),
            DispatchEvent::IdleDistributed { job_id, .. } => Some(*job_id),
            DispatchEvent::TradeCompleted { job_id, .. } => Some(*job_id),
            DispatchEvent::TradeFailed { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            DispatchEvent::JobEnqueued {
                job_id,
                queue,
                priority,
                ..
            } => format!("Job {} enqueued to {} at priority {}", job_id, queue, priority),
            DispatchEvent::QueuesCleared { discarded, .. } => {
                format!("All queues cleared ({} discarded)", discarded)
            }
            DispatchEvent::JobDispatched {
                job_id,
                queue,
                worker_id,
                ..
            } => format!("Job {} from {} handed to {}", job_id, queue, worker_id),
            DispatchEvent::IdleDistributed {
                job_id, worker_id, ..
            } => format!("Filler job {} handed to {}", job_id, worker_id),
            DispatchEvent::TradeCompleted {
                job_id,
                duration_ms,
                ..
            } => format!("Trade {} completed in {}ms", job_id, duration_ms),
            DispatchEvent::TradeFailed { job_id, error, .. } => {
                format!("Trade {} failed: {}", job_id, error)
            }
            DispatchEvent::WorkerStarted {
                worker_id, routine, ..
            } => format!("Worker {} started as {}", worker_id, routine),
            DispatchEvent::WorkerStopped { worker_id, .. } => {
                format!("Worker {} stopped", worker_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() -> Result<(), serde_json::Error> {
        let event = DispatchEvent::QueuesCleared {
            discarded: 3,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["event"], "queues_cleared");
        assert_eq!(json["discarded"], 3);
        assert_eq!(event.job_id(), None);
        Ok(())
    }
}
