//! Message types for actor communication.

use dispatch::QueueStats;
use ractor::RpcReplyPort;
use trade_core::{JobId, Priority, RoutineKind, TradeJob};

/// Messages for the WorkerActor.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Ask the dispatcher for work if idle.
    Poll,

    /// Shutdown the worker.
    Shutdown,
}

/// A worker known to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInfo {
    pub worker_id: String,
    pub routine: RoutineKind,
}

/// Messages for the Supervisor.
#[derive(Debug)]
pub enum SupervisorMessage<P> {
    /// Start a worker serving `routine`; replies with its id.
    SpawnWorker {
        routine: RoutineKind,
        reply: RpcReplyPort<Result<String, String>>,
    },

    /// List running workers.
    ListWorkers { reply: RpcReplyPort<Vec<WorkerInfo>> },

    /// Enqueue a job for the queue `routine` routes to.
    Enqueue {
        routine: RoutineKind,
        job: Box<TradeJob<P>>,
        priority: Priority,
        reply: RpcReplyPort<JobId>,
    },

    /// Discard every waiting job; replies with how many were dropped.
    ClearAll { reply: RpcReplyPort<usize> },

    /// Get per-queue counts.
    GetStats { reply: RpcReplyPort<QueueStats> },

    /// Stop every worker and the supervisor.
    Shutdown,
}
