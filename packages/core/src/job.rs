//! Trade job domain types.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::TradeType;

/// Unique identifier for a job, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Ulid);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a job ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Queue priority; smaller values are served first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(pub u32);

impl Priority {
    pub const TIER_1: Priority = Priority(1);
    pub const TIER_2: Priority = Priority(2);
    pub const TIER_3: Priority = Priority(3);
    /// Lowest urgency; also used for idle filler jobs.
    pub const FREE: Priority = Priority(u32::MAX);
}

impl From<u32> for Priority {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Priority::FREE {
            write!(f, "free")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Numeric handshake code both sides enter to meet in a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeCode(pub u32);

impl TradeCode {
    /// Largest code that fits the eight digit entry field.
    pub const MAX: u32 = 9999_9999;
}

impl std::fmt::Display for TradeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = format!("{:08}", self.0);
        let (head, tail) = digits.split_at(4);
        write!(f, "{head} {tail}")
    }
}

/// Who asked for a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// Display name shown to the trade partner.
    pub name: String,
    /// Stable numeric identity of the requester.
    pub id: u64,
}

impl Requester {
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// Identity used for jobs the system makes up itself.
    pub fn system(label: impl Into<String>) -> Self {
        Self::new(label, 0)
    }
}

/// A request to perform one trade.
///
/// `P` is the game-data payload handed to the trade routine; the dispatcher
/// never looks inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeJob<P> {
    /// Unique identifier for this job.
    pub id: JobId,
    pub payload: P,
    pub requester: Requester,
    pub code: TradeCode,
    pub trade_type: TradeType,
    /// Optional id the requester uses to match replies to this job.
    pub correlation_id: Option<u64>,
    /// Monotonic enqueue instant, used to compute how long the job waited.
    pub enqueued_at: Instant,
    /// Wall-clock creation time for events and display.
    pub created_at: DateTime<Utc>,
}

impl<P> TradeJob<P> {
    /// Create a job stamped with the current instant.
    pub fn new(payload: P, requester: Requester, code: TradeCode, trade_type: TradeType) -> Self {
        Self {
            id: JobId::new(),
            payload,
            requester,
            code,
            trade_type,
            correlation_id: None,
            enqueued_at: Instant::now(),
            created_at: Utc::now(),
        }
    }

    /// Set the requester correlation id.
    pub fn with_correlation_id(mut self, id: u64) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Override the enqueue instant.
    pub fn with_enqueued_at(mut self, at: Instant) -> Self {
        self.enqueued_at = at;
        self
    }

    /// How long the job has been waiting as of `now`.
    pub fn age(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}
