//! Computer players.
//!
//! A bot is an ordinary agent whose clicks come from a [`Strategy`] running
//! on its own driver thread instead of an input device. The strategy is
//! handed in when the bot is built, so tests can swap it out.

pub mod driver;
pub mod models;
pub mod strategy;

pub use driver::BotDriver;
pub use models::DifficultyParams;
pub use strategy::{BoardView, InsightStrategy, RandomStrategy, Strategy};
