//! Game configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::game::constants::{
    DEFAULT_DECK_SIZE, DEFAULT_FEATURE_COUNT, DEFAULT_FEATURE_SIZE, DEFAULT_TABLE_SIZE, SET_SIZE,
};

/// Bot difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotDifficulty {
    Easy,     // Mostly random clicking
    Standard, // Spots a set about half of the time
    Sharp,    // Nearly always goes for a real set
}

impl std::fmt::Display for BotDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotDifficulty::Easy => write!(f, "easy"),
            BotDifficulty::Standard => write!(f, "standard"),
            BotDifficulty::Sharp => write!(f, "sharp"),
        }
    }
}

impl std::str::FromStr for BotDifficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "standard" => Ok(Self::Standard),
            "sharp" => Ok(Self::Sharp),
            other => Err(ConfigError::invalid(
                "bot_difficulty",
                format!("unknown difficulty '{other}'"),
            )),
        }
    }
}

/// How the turn clock drives a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Reshuffle when the countdown runs out.
    Countdown(Duration),
    /// Show elapsed time; reshuffle when the table holds no set.
    Elapsed,
    /// No display; reshuffle when the table holds no set.
    Untimed,
}

/// Game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of distinct cards (default: 81)
    pub deck_size: usize,

    /// Number of slots on the table (default: 12)
    pub table_size: usize,

    /// Number of values each feature can take (default: 3)
    pub feature_size: usize,

    /// Number of features per card (default: 4)
    pub feature_count: usize,

    /// Number of human players; they get the lowest ids
    pub human_players: usize,

    /// Number of computer players
    pub computer_players: usize,

    /// Display names, indexed by player id. Missing names are generated.
    pub player_names: Vec<String>,

    /// `> 0` countdown, `0` elapsed time, `< 0` untimed
    pub turn_timeout_millis: i64,

    /// Countdown turns into a warning below this many milliseconds
    pub turn_timeout_warning_millis: u64,

    /// Freeze after a valid claim (0 skips the freeze)
    pub point_freeze_millis: u64,

    /// Freeze after an invalid claim (0 skips the freeze)
    pub penalty_freeze_millis: u64,

    /// Artificial delay for each card placed or removed
    pub table_delay_millis: u64,

    /// Pause after winners are announced
    pub end_game_pause_millis: u64,

    /// Log every set on the table after each deal
    pub hints: bool,

    /// Strategy preset for computer players
    pub bot_difficulty: BotDifficulty,

    /// Overrides the preset's thinking time per bot click
    pub bot_think_millis: Option<u64>,

    /// Seed for a reproducible deck order
    pub shuffle_seed: Option<u64>,

    /// How long a pause may take before the game is declared stuck
    pub pause_rendezvous_millis: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            deck_size: DEFAULT_DECK_SIZE,
            table_size: DEFAULT_TABLE_SIZE,
            feature_size: DEFAULT_FEATURE_SIZE,
            feature_count: DEFAULT_FEATURE_COUNT,
            human_players: 2,
            computer_players: 2,
            player_names: Vec::new(),
            turn_timeout_millis: 60_000,
            turn_timeout_warning_millis: 5_000,
            point_freeze_millis: 1_000,
            penalty_freeze_millis: 3_000,
            table_delay_millis: 0,
            end_game_pause_millis: 0,
            hints: false,
            bot_difficulty: BotDifficulty::Standard,
            bot_think_millis: None,
            shuffle_seed: None,
            pause_rendezvous_millis: 5_000,
        }
    }
}

impl GameConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_size == 0 {
            return Err(ConfigError::invalid("table_size", "must be positive"));
        }

        if self.table_size > self.deck_size {
            return Err(ConfigError::invalid(
                "table_size",
                format!("cannot exceed the deck size ({})", self.deck_size),
            ));
        }

        if self.feature_size < SET_SIZE {
            return Err(ConfigError::invalid(
                "feature_size",
                format!("must be at least {SET_SIZE}"),
            ));
        }

        let expected_deck = (self.feature_size as u128).checked_pow(self.feature_count as u32);
        if expected_deck != Some(self.deck_size as u128) {
            return Err(ConfigError::invalid(
                "deck_size",
                format!(
                    "must equal feature_size ^ feature_count ({}^{})",
                    self.feature_size, self.feature_count
                ),
            ));
        }

        if self.player_count() == 0 {
            return Err(ConfigError::invalid(
                "human_players",
                "need at least one human or computer player",
            ));
        }

        if self.turn_timeout_millis > 0
            && self.turn_timeout_warning_millis > self.turn_timeout_millis as u64
        {
            return Err(ConfigError::invalid(
                "turn_timeout_warning_millis",
                "cannot exceed the turn timeout",
            ));
        }

        if self.pause_rendezvous_millis == 0 {
            return Err(ConfigError::invalid(
                "pause_rendezvous_millis",
                "must be positive",
            ));
        }

        Ok(())
    }

    pub fn player_count(&self) -> usize {
        self.human_players + self.computer_players
    }

    pub fn is_human(&self, player: usize) -> bool {
        player < self.human_players
    }

    pub fn player_name(&self, player: usize) -> String {
        self.player_names
            .get(player)
            .cloned()
            .unwrap_or_else(|| format!("Player {}", player + 1))
    }

    pub fn timer_mode(&self) -> TimerMode {
        match self.turn_timeout_millis {
            t if t > 0 => TimerMode::Countdown(Duration::from_millis(t as u64)),
            0 => TimerMode::Elapsed,
            _ => TimerMode::Untimed,
        }
    }

    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_millis)
    }

    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_millis)
    }

    pub fn table_delay(&self) -> Duration {
        Duration::from_millis(self.table_delay_millis)
    }

    pub fn pause_rendezvous(&self) -> Duration {
        Duration::from_millis(self.pause_rendezvous_millis)
    }
}
