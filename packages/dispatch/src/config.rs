//! Dispatcher configuration.
//!
//! [`DispatchConfig`] is the raw, serde-facing shape an operator edits.
//! [`DispatchConfig::resolve`] validates it into [`DispatchSettings`], which is
//! what the queue manager reads on every call through a [`SharedConfig`].

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use trade_core::{QueueKind, TradeCode};

use crate::error::{DispatchError, DispatchResult};

/// How a flexible worker picks the queue to serve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexYieldMode {
    /// Walk a fixed precedence list and take the first job found.
    LessCheatyFirst,
    /// Prefer the smallest head priority, then the heaviest queue.
    #[default]
    Weighted,
}

/// Multipliers feeding the weight of one queue kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindBias {
    /// Weight added per job waiting in the queue.
    pub count: i64,
    /// Weight added per second the head job has waited.
    pub wait: i64,
}

impl Default for KindBias {
    fn default() -> Self {
        Self {
            count: 100,
            wait: 1,
        }
    }
}

/// Queue selection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub flex_mode: FlexYieldMode,
    /// Bias for every kind without an entry in `weights`.
    pub default_bias: KindBias,
    /// Per-kind overrides keyed by queue kind name (`"seed_check"`, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, KindBias>,
}

/// Idle-time distribution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Hand out pool entries when a flexible worker finds every queue empty.
    pub distribute_while_idle: bool,
    /// Use a random trade code for filler jobs instead of `trade_code`.
    pub random_code: bool,
    pub trade_code: u32,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            distribute_while_idle: true,
            random_code: false,
            trade_code: 7196,
        }
    }
}

/// Bounds for randomly generated trade codes (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeCodeConfig {
    pub code_min: u32,
    pub code_max: u32,
}

impl Default for TradeCodeConfig {
    fn default() -> Self {
        Self {
            code_min: 0,
            code_max: TradeCode::MAX,
        }
    }
}

/// Complete dispatcher configuration as loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub queues: QueueConfig,
    pub distribution: DistributionConfig,
    pub trade: TradeCodeConfig,
}

impl DispatchConfig {
    /// Parse a configuration document.
    pub fn from_json(json: &str) -> DispatchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and resolve into the settings the manager reads.
    pub fn resolve(&self) -> DispatchResult<DispatchSettings> {
        let mut biases = [self.queues.default_bias; QueueKind::ALL.len()];
        for (name, bias) in &self.queues.weights {
            let kind: QueueKind = name.parse()?;
            biases[kind.index()] = *bias;
        }

        let settings = DispatchSettings {
            queues: QueueSettings {
                flex_mode: self.queues.flex_mode,
                biases,
            },
            distribution: self.distribution.clone(),
            trade: self.trade,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Resolved queue selection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    pub flex_mode: FlexYieldMode,
    biases: [KindBias; QueueKind::ALL.len()],
}

impl QueueSettings {
    /// Bias in effect for `kind`.
    pub fn bias(&self, kind: QueueKind) -> KindBias {
        self.biases[kind.index()]
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            flex_mode: FlexYieldMode::default(),
            biases: [KindBias::default(); QueueKind::ALL.len()],
        }
    }
}

/// Validated configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSettings {
    pub queues: QueueSettings,
    pub distribution: DistributionConfig,
    pub trade: TradeCodeConfig,
}

impl DispatchSettings {
    /// Check the trade code bounds and the fixed distribution code.
    pub fn validate(&self) -> DispatchResult<()> {
        let trade = self.trade;
        if trade.code_min > trade.code_max {
            return Err(DispatchError::InvalidConfig(format!(
                "code_min {} is above code_max {}",
                trade.code_min, trade.code_max
            )));
        }
        if trade.code_max > TradeCode::MAX {
            return Err(DispatchError::InvalidConfig(format!(
                "code_max {} exceeds {}",
                trade.code_max,
                TradeCode::MAX
            )));
        }
        if self.distribution.trade_code > TradeCode::MAX {
            return Err(DispatchError::InvalidConfig(format!(
                "distribution trade_code {} exceeds {}",
                self.distribution.trade_code,
                TradeCode::MAX
            )));
        }
        Ok(())
    }
}

/// Configuration shared between the manager and whoever edits it.
///
/// Readers take a cheap snapshot per call; writers swap in a freshly
/// validated snapshot, so a call never sees a half-applied change.
#[derive(Debug, Default)]
pub struct SharedConfig {
    current: RwLock<Arc<DispatchSettings>>,
}

impl SharedConfig {
    /// Validate `config` and wrap it.
    pub fn new(config: &DispatchConfig) -> DispatchResult<Self> {
        Self::from_settings(config.resolve()?)
    }

    /// Wrap settings built by hand, validating them first.
    pub fn from_settings(settings: DispatchSettings) -> DispatchResult<Self> {
        settings.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(settings)),
        })
    }

    /// The settings in effect right now.
    pub fn current(&self) -> Arc<DispatchSettings> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the settings; an invalid config leaves the old ones in place.
    pub fn replace(&self, config: &DispatchConfig) -> DispatchResult<()> {
        let settings = Arc::new(config.resolve()?);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
        tracing::info!("Dispatch configuration replaced");
        Ok(())
    }

    /// Apply an in-place edit to a copy of the current settings and swap it
    /// in. An edit that fails validation leaves the old settings in place.
    pub fn update(&self, edit: impl FnOnce(&mut DispatchSettings)) -> DispatchResult<()> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = DispatchSettings::clone(&guard);
        edit(&mut next);
        next.validate()?;
        *guard = Arc::new(next);
        Ok(())
    }
}
