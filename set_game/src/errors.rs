//! Error types.
//!
//! Stale, invalid and race-invalidated claims are ordinary values handled
//! inside the state machine and arbiter; only the conditions below ever
//! cross a component boundary.

use thiserror::Error;

use crate::game::entities::{ActorState, Card, PlayerId, Slot};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Table mutation errors. These indicate a dealing bug, not a game outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("slot {0} does not exist")]
    SlotOutOfRange(Slot),

    #[error("card {0} does not exist")]
    CardOutOfRange(Card),

    #[error("slot {slot} already holds card {card}")]
    SlotOccupied { slot: Slot, card: Card },

    #[error("card {card} already sits in slot {slot}")]
    CardAlreadyPlaced { card: Card, slot: Slot },
}

/// Snapshot of one agent taken for a diagnostic dump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentDump {
    pub player: PlayerId,
    pub name: String,
    pub state: ActorState,
    pub score: u32,
    pub tokens: Vec<Slot>,
    pub pending_clicks: usize,
    pub pending_notifications: usize,
    pub freeze_remainder_ms: u64,
}

impl std::fmt::Display for AgentDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "player {} ({}) state={} score={} tokens={:?} clicks={} notifications={} freeze={}ms",
            self.player,
            self.name,
            self.state,
            self.score,
            self.tokens,
            self.pending_clicks,
            self.pending_notifications,
            self.freeze_remainder_ms
        )
    }
}

/// Game-level errors
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to spawn thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// An agent did not reach `Paused` within the rendezvous bound. This is
    /// a lost wakeup or deadlock, not a game condition.
    #[error("Players {stuck:?} did not pause within {waited_ms}ms")]
    UnresponsiveActor {
        stuck: Vec<PlayerId>,
        waited_ms: u64,
        dump: Vec<AgentDump>,
    },

    #[error("Thread {0} panicked")]
    ThreadPanicked(String),
}

pub type GameResult<T> = Result<T, GameError>;
