//! Supervisor actor owning the dispatcher and its workers.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dispatch::QueueManager;
use ractor::{Actor, ActorCell, ActorId, ActorProcessingErr, ActorRef, SupervisionEvent};
use trade_core::{DispatchEvent, QueueKind, RoutineKind};
use tokio::sync::broadcast;

use crate::handler::TradeExecutor;
use crate::messages::{SupervisorMessage, WorkerInfo, WorkerMessage};
use crate::worker_actor::{WorkerActor, WorkerArgs};

/// Tuning for the worker hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// How often an idle worker asks for work.
    pub poll_interval: Duration,
    /// Longest a single trade may run before it is reported as failed.
    pub trade_timeout: Duration,
    /// Buffered events per subscriber.
    pub event_capacity: usize,
    /// Register the supervisor under this name.
    pub name: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            trade_timeout: Duration::from_secs(300),
            event_capacity: 1024,
            name: None,
        }
    }
}

struct WorkerEntry {
    info: WorkerInfo,
    actor: ActorRef<WorkerMessage>,
}

/// State for the supervisor actor.
pub struct SupervisorState<P> {
    manager: Arc<QueueManager<P>>,
    executor: Arc<dyn TradeExecutor<P>>,
    event_tx: broadcast::Sender<DispatchEvent>,
    config: HubConfig,
    /// Running workers by actor ID.
    workers: HashMap<ActorId, WorkerEntry>,
    /// Worker counter for unique IDs.
    worker_counter: u64,
}

impl<P> SupervisorState<P> {
    /// Generate a unique worker ID.
    fn next_worker_id(&mut self) -> String {
        self.worker_counter += 1;
        format!("worker-{}", self.worker_counter)
    }
}

/// Supervisor actor arguments.
pub struct SupervisorArgs<P> {
    pub manager: Arc<QueueManager<P>>,
    pub executor: Arc<dyn TradeExecutor<P>>,
    pub event_tx: broadcast::Sender<DispatchEvent>,
    pub config: HubConfig,
}

/// Supervisor actor that owns the queue manager and the workers polling it.
pub struct Supervisor<P> {
    _payload: PhantomData<fn() -> P>,
}

impl<P> Supervisor<P> {
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<P> Default for Supervisor<P> {
    fn default() -> Self {
        Self::new()
    }
}

async fn spawn_worker<P>(
    supervisor: ActorCell,
    state: &mut SupervisorState<P>,
    routine: RoutineKind,
) -> Result<String, ActorProcessingErr>
where
    P: Clone + Send + Sync + 'static,
{
    let worker_id = state.next_worker_id();
    let args = WorkerArgs {
        worker_id: worker_id.clone(),
        routine,
        manager: state.manager.clone(),
        executor: state.executor.clone(),
        event_tx: state.event_tx.clone(),
        poll_interval: state.config.poll_interval,
        trade_timeout: state.config.trade_timeout,
    };

    let (actor, _handle) = Actor::spawn_linked(None, WorkerActor::new(), args, supervisor)
        .await
        .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn worker: {}", e)))?;

    state.workers.insert(
        actor.get_id(),
        WorkerEntry {
            info: WorkerInfo {
                worker_id: worker_id.clone(),
                routine,
            },
            actor,
        },
    );

    Ok(worker_id)
}

impl<P> Actor for Supervisor<P>
where
    P: Clone + Send + Sync + 'static,
{
    type Msg = SupervisorMessage<P>;
    type State = SupervisorState<P>;
    type Arguments = SupervisorArgs<P>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting trade hub supervisor");

        Ok(SupervisorState {
            manager: args.manager,
            executor: args.executor,
            event_tx: args.event_tx,
            config: args.config,
            workers: HashMap::new(),
            worker_counter: 0,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisorMessage::SpawnWorker { routine, reply } => {
                let result = spawn_worker(myself.get_cell(), state, routine)
                    .await
                    .map_err(|e| e.to_string());
                let _ = reply.send(result);
            }

            SupervisorMessage::ListWorkers { reply } => {
                let mut workers: Vec<WorkerInfo> =
                    state.workers.values().map(|w| w.info.clone()).collect();
                workers.sort_by(|a, b| a.worker_id.cmp(&b.worker_id));
                let _ = reply.send(workers);
            }

            SupervisorMessage::Enqueue {
                routine,
                job,
                priority,
                reply,
            } => {
                let job = *job;
                let job_id = job.id;
                state.manager.enqueue(routine, job, priority);

                let _ = state.event_tx.send(DispatchEvent::JobEnqueued {
                    job_id,
                    queue: QueueKind::for_routine(routine),
                    priority,
                    timestamp: Utc::now(),
                });
                let _ = reply.send(job_id);
            }

            SupervisorMessage::ClearAll { reply } => {
                let discarded = state.manager.clear_all();
                let _ = state.event_tx.send(DispatchEvent::QueuesCleared {
                    discarded,
                    timestamp: Utc::now(),
                });
                let _ = reply.send(discarded);
            }

            SupervisorMessage::GetStats { reply } => {
                let _ = reply.send(state.manager.stats());
            }

            SupervisorMessage::Shutdown => {
                tracing::info!("Shutting down trade hub supervisor");
                for worker in state.workers.values() {
                    let _ = worker.actor.send_message(WorkerMessage::Shutdown);
                }
                myself.stop(None);
                return Ok(());
            }
        }

        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                if let Some(worker) = state.workers.remove(&cell.get_id()) {
                    tracing::info!(
                        "Worker {} terminated: {:?}",
                        worker.info.worker_id,
                        reason
                    );
                }
            }
            SupervisionEvent::ActorFailed(cell, error) => {
                if let Some(worker) = state.workers.remove(&cell.get_id()) {
                    tracing::warn!("Worker {} failed: {}", worker.info.worker_id, error);
                    let _ = state.event_tx.send(DispatchEvent::WorkerStopped {
                        worker_id: worker.info.worker_id,
                        timestamp: Utc::now(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}
