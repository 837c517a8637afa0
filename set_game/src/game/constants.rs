//! Game-wide constants.

/// Number of cards that make up a set, and the most tokens an actor may hold.
pub const SET_SIZE: usize = 3;

pub const DEFAULT_DECK_SIZE: usize = 81;
pub const DEFAULT_TABLE_SIZE: usize = 12;
pub const DEFAULT_FEATURE_SIZE: usize = 3;
pub const DEFAULT_FEATURE_COUNT: usize = 4;

/// How often frozen actors refresh their freeze display.
pub const FREEZE_DISPLAY_INTERVAL_MS: u64 = 250;

/// Countdown display refresh period outside the warning window.
pub const CLOCK_TICK_MS: u64 = 1000;

/// Countdown display refresh period inside the warning window.
pub const CLOCK_WARNING_TICK_MS: u64 = 10;

/// Back-off window for resubmitting a claim rejected as stale.
pub const MIN_RETRY_WAIT_MS: u64 = 10;
pub const MAX_RETRY_WAIT_MS: u64 = 100;
