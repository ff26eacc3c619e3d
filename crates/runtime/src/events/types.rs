//! Event types carried on the bus.

use std::collections::HashMap;

use behavior_tree::{NodeId, Status};
use serde::{Deserialize, Serialize};

use super::bus::Topic;
use crate::manager::ExecutionState;

/// Kinds of world-wide events, grouped by topic.
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum GlobalEventType {
    // Player
    PlayerCommittedCrime,
    PlayerCompletedQuest,
    PlayerEnteredRegion,
    PlayerLeftRegion,
    PlayerDied,
    PlayerLevelUp,

    // Faction
    FactionWarDeclared,
    FactionAllianceFormed,
    FactionPeaceNegotiated,
    FactionReputationChanged,
    FactionLeadershipChanged,

    // World
    WorldStateChanged,
    WorldSaveRequested,
    WorldSaveCompleted,
    WorldLoadRequested,
    WorldLoadCompleted,

    // Ecosystem
    SeasonChanged,
    WeatherChanged,
    ResourceDepleted,
    ResourceDiscovered,
    AnimalPopulationChanged,
    EnvironmentalEventTriggered,

    // NPC
    NpcRoutineChanged,
    NpcMoraleChanged,
    NpcMemoryAdded,
    NpcDied,
    NpcSpawned,

    // Combat
    CombatStarted,
    CombatEnded,
    DragonSighted,

    // Economy
    TradeCompleted,
    MarketPriceChanged,

    // Quest
    QuestStarted,
    QuestCompleted,
    QuestFailed,

    Custom,
}

impl GlobalEventType {
    pub fn topic(self) -> Topic {
        use GlobalEventType::*;

        match self {
            PlayerCommittedCrime | PlayerCompletedQuest | PlayerEnteredRegion
            | PlayerLeftRegion | PlayerDied | PlayerLevelUp => Topic::Player,
            FactionWarDeclared | FactionAllianceFormed | FactionPeaceNegotiated
            | FactionReputationChanged | FactionLeadershipChanged => Topic::Faction,
            WorldStateChanged | WorldSaveRequested | WorldSaveCompleted | WorldLoadRequested
            | WorldLoadCompleted => Topic::World,
            SeasonChanged | WeatherChanged | ResourceDepleted | ResourceDiscovered
            | AnimalPopulationChanged | EnvironmentalEventTriggered => Topic::Ecosystem,
            NpcRoutineChanged | NpcMoraleChanged | NpcMemoryAdded | NpcDied | NpcSpawned => {
                Topic::Npc
            }
            CombatStarted | CombatEnded | DragonSighted => Topic::Combat,
            TradeCompleted | MarketPriceChanged => Topic::Economy,
            QuestStarted | QuestCompleted | QuestFailed => Topic::Quest,
            Custom => Topic::Custom,
        }
    }
}

/// Processing priority hint attached to every event.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Hash,
    Eq,
    PartialEq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum EventPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// A world event with free-form string payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalEvent {
    pub event_type: GlobalEventType,
    pub priority: EventPriority,
    /// Simulation time at which the event was raised.
    pub timestamp: f32,
    pub source: String,
    pub target: String,
    pub data: HashMap<String, String>,
}

impl GlobalEvent {
    pub fn new(event_type: GlobalEventType) -> Self {
        Self {
            event_type,
            priority: EventPriority::Normal,
            timestamp: 0.0,
            source: String::new(),
            target: String::new(),
            data: HashMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn at(mut self, timestamp: f32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn targeting(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn topic(&self) -> Topic {
        self.event_type.topic()
    }
}

/// Notifications a manager sends about itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    /// The execution state machine moved between two states.
    StateChanged {
        from: ExecutionState,
        to: ExecutionState,
    },

    /// The root finished a run with a terminal status.
    TreeCompleted { root: NodeId, status: Status },
}
