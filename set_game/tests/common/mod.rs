//! Shared helpers for the game integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use set_game::{
    ActorState, Card, DisplaySink, FeatureMatcher, GameConfig, GameHandle, GameResult,
    GameSummary, MatchPredicate, PlayerId, Slot,
};
use std::{
    thread,
    time::{Duration, Instant},
};

/// Everything the core told the display, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayEvent {
    Score(PlayerId, u32),
    Freeze(PlayerId, u64),
    Countdown(u64, bool),
    Elapsed(u64),
    PlaceCard(Card, Slot),
    RemoveCard(Slot),
    PlaceToken(PlayerId, Slot),
    RemoveToken(PlayerId, Slot),
    RemoveTokens(Slot),
    Winners(Vec<PlayerId>),
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    pub fn freezes_of(&self, player: PlayerId) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DisplayEvent::Freeze(p, ms) if p == player => Some(ms),
                _ => None,
            })
            .collect()
    }

    pub fn winners(&self) -> Option<Vec<PlayerId>> {
        self.events().into_iter().find_map(|event| match event {
            DisplayEvent::Winners(winners) => Some(winners),
            _ => None,
        })
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().push(event);
    }
}

impl DisplaySink for RecordingDisplay {
    fn set_score(&self, player: PlayerId, score: u32) {
        self.push(DisplayEvent::Score(player, score));
    }
    fn set_freeze(&self, player: PlayerId, remaining_ms: u64) {
        self.push(DisplayEvent::Freeze(player, remaining_ms));
    }
    fn set_countdown(&self, remaining_ms: u64, warn: bool) {
        self.push(DisplayEvent::Countdown(remaining_ms, warn));
    }
    fn set_elapsed(&self, elapsed_ms: u64) {
        self.push(DisplayEvent::Elapsed(elapsed_ms));
    }
    fn place_card(&self, card: Card, slot: Slot) {
        self.push(DisplayEvent::PlaceCard(card, slot));
    }
    fn remove_card(&self, slot: Slot) {
        self.push(DisplayEvent::RemoveCard(slot));
    }
    fn place_token(&self, player: PlayerId, slot: Slot) {
        self.push(DisplayEvent::PlaceToken(player, slot));
    }
    fn remove_token(&self, player: PlayerId, slot: Slot) {
        self.push(DisplayEvent::RemoveToken(player, slot));
    }
    fn remove_tokens(&self, slot: Slot) {
        self.push(DisplayEvent::RemoveTokens(slot));
    }
    fn announce_winners(&self, players: &[PlayerId]) {
        self.push(DisplayEvent::Winners(players.to_vec()));
    }
}

/// Humans only, long countdown, no freezes, fixed deck.
pub fn humans_config(humans: usize) -> GameConfig {
    GameConfig {
        human_players: humans,
        computer_players: 0,
        turn_timeout_millis: 60_000,
        turn_timeout_warning_millis: 0,
        point_freeze_millis: 0,
        penalty_freeze_millis: 0,
        shuffle_seed: Some(7),
        ..Default::default()
    }
}

/// Poll `condition` until it holds or `timeout` runs out.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub fn wait_for_state(game: &GameHandle, player: PlayerId, state: ActorState) -> bool {
    wait_until(Duration::from_secs(5), || {
        game.agent(player).is_some_and(|agent| agent.state() == state)
    })
}

/// Slots of some set currently on the table.
pub fn set_slots(game: &GameHandle) -> Option<[Slot; 3]> {
    let matcher = FeatureMatcher::default();
    let snapshot = game.table().snapshot();
    let cards: Vec<Card> = snapshot.iter().flatten().copied().collect();
    let set = matcher.find_any_match(&cards)?;
    let slot_of = |card: Card| snapshot.iter().position(|c| *c == Some(card));
    Some([slot_of(set[0])?, slot_of(set[1])?, slot_of(set[2])?])
}

/// Slots of three cards on the table that do not form a set.
pub fn non_set_slots(game: &GameHandle) -> Option<[Slot; 3]> {
    let matcher = FeatureMatcher::default();
    let snapshot = game.table().snapshot();
    let occupied: Vec<Slot> = (0..snapshot.len())
        .filter(|&slot| snapshot[slot].is_some())
        .collect();
    for (i, &a) in occupied.iter().enumerate() {
        for (j, &b) in occupied.iter().enumerate().skip(i + 1) {
            for &c in occupied.iter().skip(j + 1) {
                let (ca, cb, cc) = (snapshot[a]?, snapshot[b]?, snapshot[c]?);
                if !matcher.is_match(ca, cb, cc) {
                    return Some([a, b, c]);
                }
            }
        }
    }
    None
}

/// Click every slot for `player`, waiting for each token to land.
pub fn click_all(game: &GameHandle, player: PlayerId, slots: &[Slot]) {
    for (idx, &slot) in slots.iter().enumerate() {
        assert!(
            wait_until(Duration::from_secs(5), || game.key_pressed(player, slot)),
            "player {player} never accepted a click on slot {slot}"
        );
        if idx + 1 < slots.len() {
            assert!(
                wait_until(Duration::from_secs(5), || {
                    game.table().tokens_of(player).len() > idx
                }),
                "token on slot {slot} never landed"
            );
        }
    }
}

/// Join the game, terminating it if it does not finish on its own in time.
pub fn join_within(game: GameHandle, timeout: Duration) -> (GameResult<GameSummary>, bool) {
    let finished = wait_until(timeout, || game.is_finished());
    if !finished {
        game.terminate();
    }
    (game.join(), finished)
}
