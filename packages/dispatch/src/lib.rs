//! Multi-queue trade dispatcher.
//!
//! Jobs wait in one priority queue per [`QueueKind`](trade_core::QueueKind).
//! Workers ask the [`QueueManager`] for work either for a single queue or
//! flexibly, in which case a selection strategy picks the queue:
//!
//! - `Weighted` - smallest head priority wins, ties go to the heaviest queue
//!   as scored by a [`Weigher`]
//! - `LessCheatyFirst` - a fixed precedence list
//!
//! LAN queues have their own weighted selection and never mix with the rest.
//! When a flexible worker finds nothing, the manager can hand out a filler job
//! drawn from the [`DistributionPool`].
//!
//! # Usage
//!
//! ```ignore
//! use dispatch::{DispatchConfig, QueueManager};
//! use trade_core::{Priority, RoutineKind};
//!
//! let manager = QueueManager::new(&DispatchConfig::default())?;
//! manager.enqueue(RoutineKind::Clone, job, Priority::TIER_3);
//! if let Some(dispatched) = manager.dispatch("console-1", RoutineKind::FlexTrade) {
//!     // run the trade
//! }
//! ```

mod clock;
pub mod config;
mod error;
mod manager;
mod observer;
mod pool;
mod queue;
mod random;
mod weight;

pub use clock::{Clock, SystemClock};
pub use config::{
    DispatchConfig, DispatchSettings, DistributionConfig, FlexYieldMode, KindBias, QueueConfig,
    QueueSettings, SharedConfig, TradeCodeConfig,
};
pub use error::{DispatchError, DispatchResult};
pub use manager::{DispatchSource, Dispatched, IDLE_REQUESTER, QueueManager, QueueStats};
pub use observer::{DispatchObserver, FnObserver, ObserverList, ObserverResult};
pub use pool::DistributionPool;
pub use queue::{QueueHead, Queued, TradeQueue};
pub use random::{Randomness, SeededRandomness, ThreadRandomness};
pub use weight::{FnWeigher, Weigher};
