//! Worker actor that polls the dispatcher and runs trades.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dispatch::{DispatchSource, Dispatched, QueueManager};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use trade_core::{DispatchEvent, JobId, RoutineKind};
use tokio::sync::broadcast;

use crate::handler::TradeExecutor;
use crate::messages::WorkerMessage;

/// State for the worker actor.
pub struct WorkerActorState<P> {
    /// Unique worker ID.
    pub worker_id: String,
    /// What this worker asks the dispatcher for.
    pub routine: RoutineKind,
    /// Job currently being traded.
    pub current_job: Option<JobId>,
    manager: Arc<QueueManager<P>>,
    executor: Arc<dyn TradeExecutor<P>>,
    event_tx: broadcast::Sender<DispatchEvent>,
    trade_timeout: Duration,
    /// Whether the worker should continue running.
    running: bool,
}

impl<P> WorkerActorState<P> {
    /// Check if the worker is idle.
    pub fn is_idle(&self) -> bool {
        self.current_job.is_none()
    }

    fn publish(&self, event: DispatchEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Worker actor arguments.
pub struct WorkerArgs<P> {
    pub worker_id: String,
    pub routine: RoutineKind,
    pub manager: Arc<QueueManager<P>>,
    pub executor: Arc<dyn TradeExecutor<P>>,
    pub event_tx: broadcast::Sender<DispatchEvent>,
    pub poll_interval: Duration,
    pub trade_timeout: Duration,
}

/// Worker actor that executes trades.
pub struct WorkerActor<P> {
    _payload: PhantomData<fn() -> P>,
}

impl<P> WorkerActor<P> {
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<P> Default for WorkerActor<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one trade to completion and report how it went.
async fn run_trade<P>(state: &mut WorkerActorState<P>, dispatched: Dispatched<P>)
where
    P: Send + Sync + 'static,
{
    let job = dispatched.job;
    state.current_job = Some(job.id);
    let started_at = Utc::now();

    let result = tokio::time::timeout(state.trade_timeout, state.executor.execute(&job)).await;
    let error = match result {
        Ok(Ok(outcome)) => {
            tracing::info!(
                "Worker {} finished job {}: {}",
                state.worker_id,
                job.id,
                outcome.summary
            );
            None
        }
        Ok(Err(error)) => Some(error),
        Err(_) => Some("Trade timed out".to_string()),
    };

    let now = Utc::now();
    match error {
        None => state.publish(DispatchEvent::TradeCompleted {
            job_id: job.id,
            trade_type: job.trade_type,
            worker_id: state.worker_id.clone(),
            duration_ms: (now - started_at).num_milliseconds().max(0) as u64,
            timestamp: now,
        }),
        Some(error) => {
            tracing::warn!(
                "Worker {} failed job {} via {}: {}",
                state.worker_id,
                job.id,
                state.executor.name(),
                error
            );
            state.publish(DispatchEvent::TradeFailed {
                job_id: job.id,
                trade_type: job.trade_type,
                worker_id: state.worker_id.clone(),
                error,
                timestamp: now,
            });
        }
    }

    state.current_job = None;
}

impl<P> Actor for WorkerActor<P>
where
    P: Clone + Send + Sync + 'static,
{
    type Msg = WorkerMessage;
    type State = WorkerActorState<P>;
    type Arguments = WorkerArgs<P>;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting worker {} as {}", args.worker_id, args.routine);

        let state = WorkerActorState {
            worker_id: args.worker_id,
            routine: args.routine,
            current_job: None,
            manager: args.manager,
            executor: args.executor,
            event_tx: args.event_tx,
            trade_timeout: args.trade_timeout,
            running: true,
        };
        state.publish(DispatchEvent::WorkerStarted {
            worker_id: state.worker_id.clone(),
            routine: state.routine,
            timestamp: Utc::now(),
        });

        // Start the poll loop
        let myself_clone = myself.clone();
        let poll_interval = args.poll_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(poll_interval).await;
                if myself_clone.send_message(WorkerMessage::Poll).is_err() {
                    break;
                }
            }
        });

        Ok(state)
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.publish(DispatchEvent::WorkerStopped {
            worker_id: state.worker_id.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Shutdown => {
                tracing::info!("Shutting down worker: {}", state.worker_id);
                state.running = false;
                myself.stop(None);
                return Ok(());
            }

            WorkerMessage::Poll => {
                if !state.running {
                    myself.stop(None);
                    return Ok(());
                }
                if !state.is_idle() {
                    return Ok(());
                }

                // Nothing available just means waiting for the next poll.
                let Some(dispatched) = state.manager.dispatch(&state.worker_id, state.routine)
                else {
                    return Ok(());
                };

                let timestamp = Utc::now();
                let event = match dispatched.source {
                    DispatchSource::Queue(queue) => DispatchEvent::JobDispatched {
                        job_id: dispatched.job.id,
                        queue,
                        priority: dispatched.priority,
                        worker_id: state.worker_id.clone(),
                        timestamp,
                    },
                    DispatchSource::Idle => DispatchEvent::IdleDistributed {
                        job_id: dispatched.job.id,
                        worker_id: state.worker_id.clone(),
                        timestamp,
                    },
                };
                state.publish(event);

                run_trade(state, dispatched).await;
            }
        }

        Ok(())
    }
}
