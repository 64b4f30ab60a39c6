#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dispatch::{
    Clock, DispatchConfig, DispatchError, DispatchSource, FlexYieldMode, FnWeigher, IDLE_REQUESTER,
    KindBias,
};
use trade_core::{Priority, QueueKind, RoutineKind, TradeCode, TradeType};

use common::{count_only, job, manager};

#[test]
fn equal_priority_goes_to_heavier_queue() -> Result<(), Box<dyn Error>> {
    let (manager, _clock) = manager(&count_only(&[("seed_check", 10), ("clone", 20)]))?;
    manager.enqueue(RoutineKind::SeedCheck, job("A", TradeType::SeedCheck), Priority(5));
    manager.enqueue(RoutineKind::Clone, job("B", TradeType::Clone), Priority(5));

    let dispatched = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(dispatched.job.payload, "B");
    assert_eq!(dispatched.source, DispatchSource::Queue(QueueKind::Clone));
    assert_eq!(dispatched.priority, Priority(5));
    Ok(())
}

#[test]
fn smaller_priority_wins_regardless_of_weight() -> Result<(), Box<dyn Error>> {
    let (manager, _clock) = manager(&count_only(&[("dump", -1000), ("seed_check", 1000)]))?;
    manager.enqueue(RoutineKind::Dump, job("C", TradeType::Dump), Priority(1));
    manager.enqueue(RoutineKind::SeedCheck, job("D", TradeType::SeedCheck), Priority(5));

    let first = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(first.job.payload, "C");

    let second = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(second.job.payload, "D");
    Ok(())
}

#[test]
fn smaller_priority_later_in_scan_displaces_heavier_head() -> Result<(), Box<dyn Error>> {
    // SeedCheck is scanned first and is far heavier; SpecificTrade is scanned
    // last with a negative weight but a more urgent head.
    let (manager, _clock) = manager(&count_only(&[("seed_check", 500), ("specific_trade", -5)]))?;
    for i in 0..4 {
        let name = format!("seed-{i}");
        let job = job(&name, TradeType::SeedCheck);
        manager.enqueue(RoutineKind::SeedCheck, job, Priority(3));
    }
    manager.enqueue(RoutineKind::LinkTrade, job("vip", TradeType::Specific), Priority(2));

    let dispatched = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(dispatched.job.payload, "vip");
    Ok(())
}

#[test]
fn equal_weights_keep_first_scanned_queue() -> Result<(), Box<dyn Error>> {
    let (manager, _clock) = manager(&count_only(&[]))?;
    manager.enqueue(RoutineKind::Clone, job("clone", TradeType::Clone), Priority(2));
    manager.enqueue(RoutineKind::SeedCheck, job("seed", TradeType::SeedCheck), Priority(2));

    let dispatched = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(dispatched.job.payload, "seed");
    Ok(())
}

#[test]
fn waiting_time_raises_weight() -> Result<(), Box<dyn Error>> {
    let mut config = DispatchConfig::default();
    config.queues.default_bias = KindBias { count: 100, wait: 1 };
    let (manager, clock) = manager(&config)?;

    // Both jobs exist before either is queued; waiting starts at enqueue.
    let old = job("old", TradeType::Dump);
    let new = job("new", TradeType::Clone);
    manager.enqueue(RoutineKind::Dump, old, Priority(3));
    clock.advance(Duration::from_secs(30));
    manager.enqueue(RoutineKind::Clone, new, Priority(3));

    // Dump: 100 * 1 + 30s. Clone: 100 * 1 + 0s.
    let dispatched = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(dispatched.job.payload, "old");
    Ok(())
}

#[test]
fn enqueue_stamps_wait_start_from_manager_clock() -> Result<(), Box<dyn Error>> {
    let (manager, clock) = manager(&count_only(&[]))?;
    clock.advance(Duration::from_secs(3600));

    let stale = job("stale", TradeType::Dump).with_enqueued_at(Instant::now());
    manager.enqueue(RoutineKind::Dump, stale, Priority(1));

    let head = manager
        .queue(QueueKind::Dump)
        .head()
        .ok_or("expected a head")?;
    assert_eq!(head.enqueued_at, clock.now());
    Ok(())
}

#[test]
fn custom_weigher_replaces_configured_weights() -> Result<(), Box<dyn Error>> {
    let (manager, _clock) = manager(&count_only(&[("seed_check", 1000)]))?;
    let manager = manager.with_weigher(Arc::new(FnWeigher::new(|_depth, _wait, kind| {
        if kind == QueueKind::PowerUp { 1 } else { 0 }
    })));
    manager.enqueue(RoutineKind::SeedCheck, job("seed", TradeType::SeedCheck), Priority(1));
    manager.enqueue(RoutineKind::PowerUp, job("power", TradeType::PowerUp), Priority(1));

    let dispatched = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(dispatched.job.payload, "power");
    Ok(())
}

#[test]
fn legacy_order_ignores_priority_and_weight() -> Result<(), Box<dyn Error>> {
    let mut config = count_only(&[("specific_trade", 1000)]);
    config.queues.flex_mode = FlexYieldMode::LessCheatyFirst;
    let (manager, _clock) = manager(&config)?;

    manager.enqueue(RoutineKind::LinkTrade, job("trade", TradeType::Specific), Priority(1));
    manager.enqueue(RoutineKind::Dump, job("dump", TradeType::Dump), Priority(1));
    manager.enqueue(RoutineKind::EggRoll, job("egg", TradeType::EggRoll), Priority(4));
    manager.enqueue(RoutineKind::Clone, job("clone", TradeType::Clone), Priority(9));
    manager.enqueue(RoutineKind::LanRoll, job("lan", TradeType::LanRoll), Priority(0));

    let order: Vec<_> = std::iter::from_fn(|| manager.try_dequeue(RoutineKind::FlexTrade))
        .map(|dispatched| dispatched.job.payload)
        .collect();
    assert_eq!(order, ["clone", "egg", "dump", "trade"]);

    // LAN queues are outside the legacy list.
    assert_eq!(manager.queue(QueueKind::LanRoll).count(), 1);
    Ok(())
}

#[test]
fn strategy_follows_config_changes_between_calls() -> Result<(), Box<dyn Error>> {
    let (manager, _clock) = manager(&count_only(&[("dump", 50)]))?;
    manager.enqueue(RoutineKind::Dump, job("dump-1", TradeType::Dump), Priority(1));
    manager.enqueue(RoutineKind::Dump, job("dump-2", TradeType::Dump), Priority(1));
    manager.enqueue(RoutineKind::SeedCheck, job("seed", TradeType::SeedCheck), Priority(1));

    let weighted = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(weighted.job.payload, "dump-1");

    manager
        .config()
        .update(|settings| settings.queues.flex_mode = FlexYieldMode::LessCheatyFirst)?;
    let legacy = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(legacy.job.payload, "seed");
    Ok(())
}

#[test]
fn lan_selection_is_isolated_from_general_queues() -> Result<(), Box<dyn Error>> {
    let (manager, _clock) = manager(&count_only(&[]))?;
    manager.enqueue(RoutineKind::Clone, job("clone", TradeType::Clone), Priority(1));

    assert!(manager.try_dequeue(RoutineKind::LanTrade).is_none());

    let mut config = count_only(&[]);
    config.queues.weights.insert("lan_roll".into(), KindBias { count: 5, wait: 0 });
    manager.config().replace(&config)?;
    let lan_trade = job("lan-trade", TradeType::LanTrade);
    manager.enqueue(RoutineKind::LanTrade, lan_trade, Priority(2));
    manager.enqueue(RoutineKind::LanRoll, job("lan-roll", TradeType::LanRoll), Priority(2));

    let flex = manager
        .try_dequeue(RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(flex.job.payload, "clone");
    assert!(manager.try_dequeue(RoutineKind::FlexTrade).is_none());

    let lan = manager
        .try_dequeue(RoutineKind::LanTrade)
        .ok_or("expected a job")?;
    assert_eq!(lan.job.payload, "lan-roll");
    assert_eq!(lan.source, DispatchSource::Queue(QueueKind::LanRoll));

    let lan = manager
        .try_dequeue(RoutineKind::LanTrade)
        .ok_or("expected a job")?;
    assert_eq!(lan.job.payload, "lan-trade");
    assert!(manager.try_dequeue(RoutineKind::LanTrade).is_none());
    Ok(())
}

#[test]
fn idle_fallback_respects_flag_and_pool() -> Result<(), Box<dyn Error>> {
    let (manager, _clock) = manager(&count_only(&[]))?;

    // Flag off, pool filled.
    manager.pool().extend(["pikachu".to_string(), "eevee".to_string()]);
    assert!(manager.try_dequeue_idle().is_none());
    assert!(manager.dispatch("bot-1", RoutineKind::FlexTrade).is_none());

    // Flag on, pool empty.
    manager
        .config()
        .update(|settings| settings.distribution.distribute_while_idle = true)?;
    manager.pool().clear();
    assert!(manager.try_dequeue_idle().is_none());
    assert!(manager.dispatch("bot-1", RoutineKind::FlexTrade).is_none());
    Ok(())
}

#[test]
fn idle_fallback_builds_filler_job() -> Result<(), Box<dyn Error>> {
    let mut config = count_only(&[]);
    config.distribution.distribute_while_idle = true;
    config.distribution.trade_code = 7196;
    let (manager, _clock) = manager(&config)?;
    manager.pool().add("ditto".to_string());

    let dispatched = manager
        .dispatch("bot-1", RoutineKind::FlexTrade)
        .ok_or("expected a filler job")?;
    assert_eq!(dispatched.source, DispatchSource::Idle);
    assert_eq!(dispatched.priority, Priority::FREE);
    assert_eq!(dispatched.job.payload, "ditto");
    assert_eq!(dispatched.job.trade_type, TradeType::Random);
    assert!(!dispatched.job.trade_type.is_user_submitted());
    assert_eq!(dispatched.job.requester.name, IDLE_REQUESTER);
    assert_eq!(dispatched.job.code, TradeCode(7196));
    assert_eq!(dispatched.job.correlation_id, None);

    // The pool keeps its entry and the queues stay untouched.
    assert_eq!(manager.pool().len(), 1);
    assert_eq!(manager.stats().total(), 0);

    // Only flexible workers fall back.
    assert!(manager.dispatch("bot-2", RoutineKind::Clone).is_none());
    assert!(manager.dispatch("bot-2", RoutineKind::LanTrade).is_none());
    Ok(())
}

#[test]
fn idle_fallback_draws_random_code_in_range() -> Result<(), Box<dyn Error>> {
    let mut config = count_only(&[]);
    config.distribution.distribute_while_idle = true;
    config.distribution.random_code = true;
    config.trade.code_min = 1000;
    config.trade.code_max = 1010;
    let (manager, _clock) = manager(&config)?;
    manager.pool().add("mew".to_string());

    for _ in 0..20 {
        let job = manager.try_dequeue_idle().ok_or("expected a filler job")?;
        assert!((1000..=1010).contains(&job.code.0));
    }
    Ok(())
}

#[test]
fn queued_work_beats_idle_fallback() -> Result<(), Box<dyn Error>> {
    let mut config = count_only(&[]);
    config.distribution.distribute_while_idle = true;
    let (manager, _clock) = manager(&config)?;
    manager.pool().add("filler".to_string());
    let real = job("real", TradeType::FixTrainerInfo);
    manager.enqueue(RoutineKind::FixTrainerInfo, real, Priority::FREE);

    let dispatched = manager
        .dispatch("bot-1", RoutineKind::FlexTrade)
        .ok_or("expected a job")?;
    assert_eq!(dispatched.job.payload, "real");
    assert_eq!(dispatched.source, DispatchSource::Queue(QueueKind::FixTrainerInfo));
    Ok(())
}

#[test]
fn unknown_kind_fails_at_construction() {
    let mut config = DispatchConfig::default();
    config
        .queues
        .weights
        .insert("surprise_trade".into(), KindBias::default());

    let result = dispatch::QueueManager::<String>::new(&config);
    assert!(matches!(result, Err(DispatchError::UnknownQueueKind(_))));
}
