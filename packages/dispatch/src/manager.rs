//! Queue manager: routing, flexible selection and the idle fallback.

use std::collections::BTreeMap;
use std::sync::Arc;

use trade_core::{Priority, QueueKind, Requester, RoutineKind, TradeCode, TradeJob, TradeType};

use crate::clock::{Clock, SystemClock};
use crate::config::{DispatchConfig, DispatchSettings, FlexYieldMode, SharedConfig};
use crate::error::DispatchResult;
use crate::observer::{DispatchObserver, ObserverList};
use crate::pool::DistributionPool;
use crate::queue::{Queued, TradeQueue};
use crate::random::{Randomness, ThreadRandomness};
use crate::weight::Weigher;

/// Requester label stamped on filler jobs from the distribution pool.
pub const IDLE_REQUESTER: &str = "Random Distribution";

/// Fixed precedence of the legacy flexible strategy.
const LEGACY_ORDER: [QueueKind; 7] = [
    QueueKind::SeedCheck,
    QueueKind::Clone,
    QueueKind::FixTrainerInfo,
    QueueKind::PowerUp,
    QueueKind::EggRoll,
    QueueKind::Dump,
    QueueKind::SpecificTrade,
];

/// Where a dispatched job came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchSource {
    Queue(QueueKind),
    /// Synthesised from the distribution pool.
    Idle,
}

/// A job handed to a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched<P> {
    pub job: TradeJob<P>,
    pub priority: Priority,
    pub source: DispatchSource,
}

impl<P> Dispatched<P> {
    fn from_queue(kind: QueueKind, queued: Queued<P>) -> Self {
        Self {
            job: queued.job,
            priority: queued.priority,
            source: DispatchSource::Queue(kind),
        }
    }
}

/// Number of waiting jobs per queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub counts: BTreeMap<QueueKind, usize>,
}

impl QueueStats {
    pub fn count(&self, kind: QueueKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Jobs waiting across every queue.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Outcome of one selection pass.
enum Selection<P> {
    Taken(Dispatched<P>),
    /// Every eligible queue was empty.
    Empty,
    /// The chosen head was taken by another worker before we dequeued it.
    Lost,
}

impl<P> Selection<P> {
    fn from_option(dispatched: Option<Dispatched<P>>) -> Self {
        dispatched.map_or(Selection::Empty, Selection::Taken)
    }

    fn into_option(self) -> Option<Dispatched<P>> {
        match self {
            Selection::Taken(dispatched) => Some(dispatched),
            Selection::Empty | Selection::Lost => None,
        }
    }
}

/// Best head seen so far during a selection scan.
struct Candidate<'a, P> {
    queue: &'a TradeQueue<P>,
    priority: Priority,
    weight: i64,
}

/// Owns one queue per [`QueueKind`] and decides which job each worker gets.
///
/// Every call is non-blocking: "nothing to do" comes back as `None` and the
/// worker is expected to ask again on its own cadence.
pub struct QueueManager<P> {
    /// Indexed by [`QueueKind::index`].
    queues: Vec<TradeQueue<P>>,
    config: Arc<SharedConfig>,
    weigher: Option<Arc<dyn Weigher>>,
    pool: Arc<DistributionPool<P>>,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn Randomness>,
    observers: ObserverList<P>,
}

impl<P> QueueManager<P> {
    /// Validate `config` and build a manager with one empty queue per kind.
    pub fn new(config: &DispatchConfig) -> DispatchResult<Self> {
        Ok(Self::with_shared_config(Arc::new(SharedConfig::new(config)?)))
    }

    /// Build a manager reading from configuration that is already validated.
    pub fn with_shared_config(config: Arc<SharedConfig>) -> Self {
        Self {
            queues: QueueKind::ALL.into_iter().map(TradeQueue::new).collect(),
            config,
            weigher: None,
            pool: Arc::new(DistributionPool::new()),
            clock: Arc::new(SystemClock),
            rng: Arc::new(ThreadRandomness),
            observers: ObserverList::new(),
        }
    }

    /// Replace the configured weight function with a custom one.
    pub fn with_weigher(mut self, weigher: Arc<dyn Weigher>) -> Self {
        self.weigher = Some(weigher);
        self
    }

    /// Use a shared distribution pool.
    pub fn with_pool(mut self, pool: Arc<DistributionPool<P>>) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_randomness(mut self, rng: Arc<dyn Randomness>) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &Arc<SharedConfig> {
        &self.config
    }

    pub fn pool(&self) -> &Arc<DistributionPool<P>> {
        &self.pool
    }

    /// The queue bound to `kind`.
    pub fn queue(&self, kind: QueueKind) -> &TradeQueue<P> {
        &self.queues[kind.index()]
    }

    /// The queue a routine enqueues into or drains.
    pub fn queue_for(&self, routine: RoutineKind) -> &TradeQueue<P> {
        self.queue(QueueKind::for_routine(routine))
    }

    /// Every queue, in scan order.
    pub fn queues(&self) -> impl Iterator<Item = &TradeQueue<P>> {
        self.queues.iter()
    }

    /// Add a job to the queue `routine` routes to.
    ///
    /// The job's wait time is measured from now, on the manager's clock.
    pub fn enqueue(&self, routine: RoutineKind, job: TradeJob<P>, priority: Priority) {
        let job = job.with_enqueued_at(self.clock.now());
        let queue = self.queue_for(routine);
        tracing::debug!(
            "Enqueue job {} for {} into {} at priority {}",
            job.id,
            job.requester.name,
            queue.kind(),
            priority
        );
        queue.enqueue(job, priority);
    }

    /// Take the next job for `routine` without notifying observers.
    ///
    /// `FlexTrade` selects across every non-LAN queue, `LanTrade` across the
    /// LAN queues; any other routine drains its own queue.
    pub fn try_dequeue(&self, routine: RoutineKind) -> Option<Dispatched<P>> {
        self.select(routine).into_option()
    }

    fn select(&self, routine: RoutineKind) -> Selection<P> {
        match routine {
            RoutineKind::FlexTrade => self.flex_dequeue(),
            RoutineKind::LanTrade => {
                let settings = self.config.current();
                self.weighted_dequeue(&settings, self.lan_queues())
            }
            _ => {
                let queue = self.queue_for(routine);
                Selection::from_option(
                    queue
                        .try_dequeue()
                        .map(|queued| Dispatched::from_queue(queue.kind(), queued)),
                )
            }
        }
    }

    /// Discard every waiting job. Observers are not told.
    pub fn clear_all(&self) -> usize {
        let discarded: usize = self.queues.iter().map(TradeQueue::clear).sum();
        tracing::info!("Cleared all queues ({} jobs discarded)", discarded);
        discarded
    }

    /// Current number of waiting jobs per queue.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            counts: self
                .queues
                .iter()
                .map(|queue| (queue.kind(), queue.count()))
                .collect(),
        }
    }

    /// Register an observer; it runs after every previously registered one.
    pub fn add_observer(&self, observer: Arc<dyn DispatchObserver<P>>) {
        self.observers.push(observer);
    }

    /// Tell every observer that `worker_id` is starting `job`.
    pub fn start_trade(&self, worker_id: &str, job: &TradeJob<P>) {
        self.observers.notify(worker_id, job);
    }

    fn general_queues(&self) -> impl Iterator<Item = &TradeQueue<P>> {
        self.queues.iter().filter(|queue| !queue.kind().is_lan())
    }

    fn lan_queues(&self) -> impl Iterator<Item = &TradeQueue<P>> {
        self.queues.iter().filter(|queue| queue.kind().is_lan())
    }

    fn flex_dequeue(&self) -> Selection<P> {
        let settings = self.config.current();
        match settings.queues.flex_mode {
            FlexYieldMode::LessCheatyFirst => self.legacy_dequeue(),
            FlexYieldMode::Weighted => self.weighted_dequeue(&settings, self.general_queues()),
        }
    }

    fn legacy_dequeue(&self) -> Selection<P> {
        Selection::from_option(LEGACY_ORDER.into_iter().find_map(|kind| {
            self.queue(kind)
                .try_dequeue()
                .map(|queued| Dispatched::from_queue(kind, queued))
        }))
    }

    /// Pick the queue whose head has the smallest priority, breaking ties by
    /// the heaviest weight, then dequeue from it once.
    fn weighted_dequeue<'a>(
        &'a self,
        settings: &DispatchSettings,
        queues: impl Iterator<Item = &'a TradeQueue<P>>,
    ) -> Selection<P> {
        let weigher: &dyn Weigher = match &self.weigher {
            Some(custom) => custom.as_ref(),
            None => &settings.queues,
        };
        let now = self.clock.now();

        let mut best: Option<Candidate<'a, P>> = None;
        for queue in queues {
            let Some(head) = queue.head() else {
                continue;
            };
            if best.as_ref().is_some_and(|b| head.priority > b.priority) {
                continue;
            }

            let wait = now.saturating_duration_since(head.enqueued_at);
            let weight = weigher.weight(head.depth, wait, queue.kind());

            let preferred = match &best {
                None => true,
                Some(b) => head.priority < b.priority || weight > b.weight,
            };
            if preferred {
                best = Some(Candidate {
                    queue,
                    priority: head.priority,
                    weight,
                });
            }
        }

        let Some(best) = best else {
            return Selection::Empty;
        };
        match best.queue.try_dequeue() {
            Some(queued) => Selection::Taken(Dispatched::from_queue(best.queue.kind(), queued)),
            None => {
                // Another worker emptied the queue between peek and dequeue.
                tracing::debug!("Lost race for {}; nothing dispatched", best.queue.kind());
                Selection::Lost
            }
        }
    }
}

impl<P: Clone> QueueManager<P> {
    /// Make up a filler job from the distribution pool, if idle distribution
    /// is enabled and the pool has anything in it.
    pub fn try_dequeue_idle(&self) -> Option<TradeJob<P>> {
        let settings = self.config.current();
        let distribution = &settings.distribution;
        if !distribution.distribute_while_idle {
            return None;
        }

        let payload = self.pool.random(self.rng.as_ref())?;
        let code = if distribution.random_code {
            self.rng
                .trade_code(settings.trade.code_min, settings.trade.code_max)
        } else {
            distribution.trade_code
        };

        let job = TradeJob::new(
            payload,
            Requester::system(IDLE_REQUESTER),
            TradeCode(code),
            TradeType::Random,
        )
        .with_enqueued_at(self.clock.now());
        Some(job)
    }

    /// Hand the next job for `routine` to `worker_id`.
    ///
    /// Flexible workers that find every queue empty fall back to the
    /// distribution pool; losing a race for a queue head does not. Observers
    /// run on every success.
    pub fn dispatch(&self, worker_id: &str, routine: RoutineKind) -> Option<Dispatched<P>> {
        let dispatched = match self.select(routine) {
            Selection::Taken(dispatched) => dispatched,
            Selection::Lost => return None,
            Selection::Empty if routine == RoutineKind::FlexTrade => {
                let job = self.try_dequeue_idle()?;
                Dispatched {
                    job,
                    priority: Priority::FREE,
                    source: DispatchSource::Idle,
                }
            }
            Selection::Empty => return None,
        };

        tracing::debug!(
            "Dispatching job {} ({:?}) to {}",
            dispatched.job.id,
            dispatched.source,
            worker_id
        );
        self.start_trade(worker_id, &dispatched.job);
        Some(dispatched)
    }
}

impl<P> std::fmt::Debug for QueueManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("queues", &self.queues)
            .field("observers", &self.observers.len())
            .finish()
    }
}
