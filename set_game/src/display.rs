//! Display sink the core reports to.
//!
//! Every call is a fire-and-forget notification: implementations must not
//! block, and the core never waits on them.

use crate::game::entities::{Card, PlayerId, Slot};

pub trait DisplaySink: Send + Sync {
    fn set_score(&self, player: PlayerId, score: u32);
    fn set_freeze(&self, player: PlayerId, remaining_ms: u64);
    fn set_countdown(&self, remaining_ms: u64, warn: bool);
    fn set_elapsed(&self, elapsed_ms: u64);
    fn place_card(&self, card: Card, slot: Slot);
    fn remove_card(&self, slot: Slot);
    fn place_token(&self, player: PlayerId, slot: Slot);
    fn remove_token(&self, player: PlayerId, slot: Slot);
    /// Every token on a slot went away with its card.
    fn remove_tokens(&self, slot: Slot);
    fn announce_winners(&self, players: &[PlayerId]);
}

/// Sink that drops every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn set_score(&self, _player: PlayerId, _score: u32) {}
    fn set_freeze(&self, _player: PlayerId, _remaining_ms: u64) {}
    fn set_countdown(&self, _remaining_ms: u64, _warn: bool) {}
    fn set_elapsed(&self, _elapsed_ms: u64) {}
    fn place_card(&self, _card: Card, _slot: Slot) {}
    fn remove_card(&self, _slot: Slot) {}
    fn place_token(&self, _player: PlayerId, _slot: Slot) {}
    fn remove_token(&self, _player: PlayerId, _slot: Slot) {}
    fn remove_tokens(&self, _slot: Slot) {}
    fn announce_winners(&self, _players: &[PlayerId]) {}
}
