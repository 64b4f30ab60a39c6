//! Core domain types for the trade dispatcher.
//!
//! This crate contains shared types used across all packages:
//! - QueueKind, RoutineKind and TradeType for routing
//! - TradeJob, Priority and TradeCode for work items
//! - Events for real-time updates

mod events;
mod job;
mod kind;

pub use events::DispatchEvent;
pub use job::{JobId, Priority, Requester, TradeCode, TradeJob};
pub use kind::{ParseKindError, QueueKind, RoutineKind, TradeType};
