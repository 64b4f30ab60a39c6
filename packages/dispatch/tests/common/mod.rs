#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dispatch::{Clock, DispatchConfig, DispatchResult, KindBias, QueueManager, SeededRandomness};
use trade_core::{Requester, TradeCode, TradeJob, TradeType};

/// A clock that only moves when told to.
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

/// Manager with a manual clock and seeded randomness.
pub fn manager(
    config: &DispatchConfig,
) -> DispatchResult<(QueueManager<String>, Arc<ManualClock>)> {
    let clock = Arc::new(ManualClock::new());
    let manager = QueueManager::new(config)?
        .with_clock(clock.clone())
        .with_randomness(Arc::new(SeededRandomness::new(42)));
    Ok((manager, clock))
}

/// Config whose weights depend only on queue depth, scaled per kind.
pub fn count_only(weights: &[(&str, i64)]) -> DispatchConfig {
    let mut config = DispatchConfig::default();
    config.distribution.distribute_while_idle = false;
    config.queues.default_bias = KindBias { count: 1, wait: 0 };
    for (name, count) in weights {
        config
            .queues
            .weights
            .insert(name.to_string(), KindBias { count: *count, wait: 0 });
    }
    config
}

pub fn job(name: &str, trade_type: TradeType) -> TradeJob<String> {
    TradeJob::new(
        name.to_string(),
        Requester::new(name, 1000),
        TradeCode(1234_5678),
        trade_type,
    )
}
