//! Client handle for a running trade hub.

use std::sync::Arc;

use dispatch::{QueueManager, QueueStats};
use ractor::{Actor, ActorRef};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use trade_core::{DispatchEvent, JobId, Priority, RoutineKind, TradeJob};

use crate::handler::TradeExecutor;
use crate::messages::{SupervisorMessage, WorkerInfo};
use crate::supervisor::{HubConfig, Supervisor, SupervisorArgs};

/// Errors talking to the hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Failed to spawn actor: {0}")]
    Spawn(#[from] ractor::SpawnErr),

    #[error("Failed to send message to the supervisor")]
    Send,

    #[error("Failed to receive response")]
    NoReply,

    #[error("Worker error: {0}")]
    Worker(String),
}

/// A running supervisor plus the manager its workers poll.
pub struct Hub<P> {
    supervisor: ActorRef<SupervisorMessage<P>>,
    handle: JoinHandle<()>,
    manager: Arc<QueueManager<P>>,
    event_tx: broadcast::Sender<DispatchEvent>,
}

/// Start the supervisor over `manager`, running trades with `executor`.
pub async fn start_hub<P>(
    manager: Arc<QueueManager<P>>,
    executor: Arc<dyn TradeExecutor<P>>,
    config: HubConfig,
) -> Result<Hub<P>, HubError>
where
    P: Clone + Send + Sync + 'static,
{
    let (event_tx, _) = broadcast::channel(config.event_capacity);
    let args = SupervisorArgs {
        manager: manager.clone(),
        executor,
        event_tx: event_tx.clone(),
        config: config.clone(),
    };

    let (supervisor, handle) = Actor::spawn(config.name, Supervisor::new(), args).await?;

    Ok(Hub {
        supervisor,
        handle,
        manager,
        event_tx,
    })
}

impl<P> Hub<P>
where
    P: Clone + Send + Sync + 'static,
{
    /// The shared manager; producers may enqueue on it directly.
    pub fn manager(&self) -> &Arc<QueueManager<P>> {
        &self.manager
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.event_tx.subscribe()
    }

    /// Start a worker serving `routine`.
    pub async fn spawn_worker(&self, routine: RoutineKind) -> Result<String, HubError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.supervisor
            .send_message(SupervisorMessage::SpawnWorker {
                routine,
                reply: tx.into(),
            })
            .map_err(|_| HubError::Send)?;

        rx.await
            .map_err(|_| HubError::NoReply)?
            .map_err(HubError::Worker)
    }

    /// List running workers, ordered by id.
    pub async fn workers(&self) -> Result<Vec<WorkerInfo>, HubError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.supervisor
            .send_message(SupervisorMessage::ListWorkers { reply: tx.into() })
            .map_err(|_| HubError::Send)?;

        rx.await.map_err(|_| HubError::NoReply)
    }

    /// Enqueue a job and publish a `JobEnqueued` event.
    pub async fn enqueue(
        &self,
        routine: RoutineKind,
        job: TradeJob<P>,
        priority: Priority,
    ) -> Result<JobId, HubError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.supervisor
            .send_message(SupervisorMessage::Enqueue {
                routine,
                job: Box::new(job),
                priority,
                reply: tx.into(),
            })
            .map_err(|_| HubError::Send)?;

        rx.await.map_err(|_| HubError::NoReply)
    }

    /// Discard every waiting job.
    pub async fn clear_all(&self) -> Result<usize, HubError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.supervisor
            .send_message(SupervisorMessage::ClearAll { reply: tx.into() })
            .map_err(|_| HubError::Send)?;

        rx.await.map_err(|_| HubError::NoReply)
    }

    pub async fn stats(&self) -> Result<QueueStats, HubError> {
        let (tx, rx) = ractor::concurrency::oneshot();
        self.supervisor
            .send_message(SupervisorMessage::GetStats { reply: tx.into() })
            .map_err(|_| HubError::Send)?;

        rx.await.map_err(|_| HubError::NoReply)
    }

    /// Stop every worker and wait for the supervisor to exit.
    pub async fn shutdown(self) -> Result<(), HubError> {
        self.supervisor
            .send_message(SupervisorMessage::Shutdown)
            .map_err(|_| HubError::Send)?;
        let _ = self.handle.await;
        Ok(())
    }
}
