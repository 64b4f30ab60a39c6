//! Actor runtime for the trade dispatcher.
//!
//! This crate runs trade workers as Ractor actors polling a shared
//! [`dispatch::QueueManager`].
//!
//! # Architecture
//!
//! - `Supervisor` - Top-level actor that owns the manager and spawns workers
//! - `WorkerActor` - Asks the manager for work and runs trades
//! - `Hub` - Client handle wrapping the supervisor's request/reply messages
//!
//! # Usage
//!
//! ```ignore
//! use actors::{FnExecutor, HubConfig, start_hub};
//! use trade_core::RoutineKind;
//!
//! let hub = start_hub(manager, Arc::new(executor), HubConfig::default()).await?;
//! hub.spawn_worker(RoutineKind::FlexTrade).await?;
//!
//! let mut events = hub.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.description());
//! }
//! ```

mod handler;
mod hub;
mod messages;
mod supervisor;
mod worker_actor;

pub use handler::{ExecFuture, ExecResult, FnExecutor, TradeExecutor, TradeOutcome};
pub use hub::{Hub, HubError, start_hub};
pub use messages::{SupervisorMessage, WorkerInfo, WorkerMessage};
pub use supervisor::{HubConfig, Supervisor, SupervisorArgs};
pub use worker_actor::{WorkerActor, WorkerArgs};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
