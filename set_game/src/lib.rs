//! # Set Game
//!
//! A real-time multiplayer Set engine. Human and computer players race to
//! claim matching triples from a shared table while a single dealer thread
//! arbitrates every claim.
//!
//! ## Architecture
//!
//! Claims are admitted with optimistic concurrency: each one carries the
//! round version it was composed against, and only a claim matching the
//! current version is admitted (bumping the version). The dealer processes
//! admitted claims in version order, so no two claims ever commit against
//! the same table arrangement.
//!
//! Every player runs a state machine on its own thread, implemented with
//! `enum_dispatch` over seven states:
//!
//! - **WaitingForActivity**: Accepting clicks, placing and removing tokens
//! - **TurningInClaim**: Submitting a complete triple, retrying when stale
//! - **WaitingForClaimResult**: Waiting for the dealer's verdict
//! - **Frozen**: Serving a point or penalty freeze
//! - **PausingExecution**: Dropping in-flight work at round end
//! - **Paused**: Between rounds
//! - **Terminated**: Done
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, claims, the table grid, the deck and the match predicate
//! - [`dealer`]: Claim arbitration, round clock and pause rendezvous
//! - [`player`]: Player agents and their state machine
//! - [`bot`]: Strategies and driver threads for computer players
//! - [`session`]: Starting a game and driving it through a handle
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use set_game::{FeatureMatcher, Game, GameConfig, NullDisplay};
//!
//! let config = GameConfig {
//!     human_players: 0,
//!     computer_players: 3,
//!     ..Default::default()
//! };
//! let game = Game::start(config, Arc::new(NullDisplay), Arc::new(FeatureMatcher::default()))?;
//! let summary = game.join()?;
//! println!("winners: {:?}", summary.winners);
//! # Ok::<(), set_game::GameError>(())
//! ```

/// Computer players.
pub mod bot;

/// Game configuration.
pub mod config;
pub use config::{BotDifficulty, GameConfig, TimerMode};

/// Dealer thread, claim arbiter and round clock.
pub mod dealer;
pub use dealer::{GameSummary, arbiter::SubmitOutcome};

/// Display sink the core reports to.
pub mod display;
pub use display::{DisplaySink, NullDisplay};

pub mod errors;
pub use errors::{AgentDump, ConfigError, GameError, GameResult, TableError};

/// Core game entities and shared table state.
pub mod game;
pub use game::{
    constants::{self, SET_SIZE},
    entities::{
        self, ActorState, Card, Claim, ClaimOutcome, InvalidReason, PlayerId, PlayerKind,
        RoundVersion, Slot, Token,
    },
    predicate::{FeatureMatcher, MatchPredicate},
    supply::CardSupply,
    table::Table,
};

/// Player agents.
pub mod player;
pub use player::AgentHandle;

pub mod session;
pub use session::{Game, GameHandle, Terminator};
