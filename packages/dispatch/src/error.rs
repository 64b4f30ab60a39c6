//! Dispatcher error types.

use thiserror::Error;
use trade_core::ParseKindError;

/// Result type for dispatcher setup and configuration.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while building or reconfiguring a dispatcher.
///
/// Running out of work is never an error; dequeue calls return `None`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    UnknownQueueKind(#[from] ParseKindError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
