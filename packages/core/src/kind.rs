//! Queue, routine and trade kinds.

use serde::{Deserialize, Serialize};

/// Identifies one of the physical queues a trade request can wait in.
///
/// The declaration order is the order in which flexible selection scans the
/// queues, so equal-weight ties resolve toward earlier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    SeedCheck,
    Dump,
    Clone,
    FixTrainerInfo,
    PowerUp,
    EggRoll,
    LanTrade,
    LanRoll,
    /// Generic trade queue; the routing fallback.
    SpecificTrade,
}

impl QueueKind {
    /// Every queue kind, in scan order.
    pub const ALL: [QueueKind; 9] = [
        QueueKind::SeedCheck,
        QueueKind::Dump,
        QueueKind::Clone,
        QueueKind::FixTrainerInfo,
        QueueKind::PowerUp,
        QueueKind::EggRoll,
        QueueKind::LanTrade,
        QueueKind::LanRoll,
        QueueKind::SpecificTrade,
    ];

    /// Position of this kind inside [`QueueKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// LAN queues are only ever served by LAN-restricted selection.
    pub fn is_lan(self) -> bool {
        matches!(self, QueueKind::LanTrade | QueueKind::LanRoll)
    }

    /// Route a worker routine to the queue it enqueues into or drains.
    ///
    /// Routines that do not name a queue fall back to the generic trade queue.
    pub fn for_routine(routine: RoutineKind) -> Self {
        match routine {
            RoutineKind::SeedCheck => QueueKind::SeedCheck,
            RoutineKind::Clone => QueueKind::Clone,
            RoutineKind::FixTrainerInfo => QueueKind::FixTrainerInfo,
            RoutineKind::PowerUp => QueueKind::PowerUp,
            RoutineKind::EggRoll => QueueKind::EggRoll,
            RoutineKind::Dump => QueueKind::Dump,
            RoutineKind::LanTrade => QueueKind::LanTrade,
            RoutineKind::LanRoll => QueueKind::LanRoll,
            RoutineKind::LinkTrade | RoutineKind::FlexTrade | RoutineKind::Idle => {
                QueueKind::SpecificTrade
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueueKind::SeedCheck => "seed_check",
            QueueKind::Dump => "dump",
            QueueKind::Clone => "clone",
            QueueKind::FixTrainerInfo => "fix_trainer_info",
            QueueKind::PowerUp => "power_up",
            QueueKind::EggRoll => "egg_roll",
            QueueKind::LanTrade => "lan_trade",
            QueueKind::LanRoll => "lan_roll",
            QueueKind::SpecificTrade => "specific_trade",
        }
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueueKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// Error returned when a kind name does not match any known kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown queue kind: {0}")]
pub struct ParseKindError(pub String);

/// What a worker has been told to do when it asks for work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    LinkTrade,
    SeedCheck,
    Clone,
    FixTrainerInfo,
    PowerUp,
    EggRoll,
    Dump,
    /// Enqueues into the LAN trade queue; as a dequeue request it selects
    /// across every LAN queue.
    LanTrade,
    LanRoll,
    /// Serve any non-LAN queue, picked by the flexible selection strategy.
    FlexTrade,
    Idle,
}

impl std::fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoutineKind::LinkTrade => "link_trade",
            RoutineKind::SeedCheck => "seed_check",
            RoutineKind::Clone => "clone",
            RoutineKind::FixTrainerInfo => "fix_trainer_info",
            RoutineKind::PowerUp => "power_up",
            RoutineKind::EggRoll => "egg_roll",
            RoutineKind::Dump => "dump",
            RoutineKind::LanTrade => "lan_trade",
            RoutineKind::LanRoll => "lan_roll",
            RoutineKind::FlexTrade => "flex_trade",
            RoutineKind::Idle => "idle",
        };
        f.write_str(name)
    }
}

/// Tag carried by every job describing which trade it asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    Specific,
    SeedCheck,
    Clone,
    FixTrainerInfo,
    PowerUp,
    EggRoll,
    Dump,
    LanTrade,
    LanRoll,
    /// Filler synthesised from the distribution pool, not user submitted.
    Random,
}

impl TradeType {
    /// Whether a user asked for this trade.
    pub fn is_user_submitted(self) -> bool {
        !matches!(self, TradeType::Random)
    }
}

impl From<QueueKind> for TradeType {
    fn from(kind: QueueKind) -> Self {
        match kind {
            QueueKind::SeedCheck => TradeType::SeedCheck,
            QueueKind::Dump => TradeType::Dump,
            QueueKind::Clone => TradeType::Clone,
            QueueKind::FixTrainerInfo => TradeType::FixTrainerInfo,
            QueueKind::PowerUp => TradeType::PowerUp,
            QueueKind::EggRoll => TradeType::EggRoll,
            QueueKind::LanTrade => TradeType::LanTrade,
            QueueKind::LanRoll => TradeType::LanRoll,
            QueueKind::SpecificTrade => TradeType::Specific,
        }
    }
}
