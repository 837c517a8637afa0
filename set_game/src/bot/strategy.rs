//! Click strategies for computer players.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use std::sync::Arc;

use crate::game::{
    constants::SET_SIZE,
    entities::{Card, PlayerId, Slot, Token},
    predicate::MatchPredicate,
    table::Table,
};

/// What a strategy gets to look at before each click.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardView {
    /// Card per slot
    pub slots: Vec<Option<Card>>,
    /// Slots the player currently has a token on
    pub tokens: Vec<Slot>,
}

impl BoardView {
    pub fn capture(table: &Table, player: PlayerId) -> Self {
        Self {
            slots: table.snapshot(),
            tokens: table.tokens_of(player),
        }
    }

    pub fn occupied(&self) -> Vec<Slot> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, card)| card.map(|_| slot))
            .collect()
    }

    fn holds(&self, token: &Token) -> bool {
        self.slots.get(token.slot) == Some(&Some(token.card))
    }
}

/// Picks the next slot a computer player clicks.
pub trait Strategy: Send {
    fn next_click(&mut self, view: &BoardView) -> Option<Slot>;
}

/// Clicks uniformly over occupied slots.
#[derive(Debug)]
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Strategy for RandomStrategy {
    fn next_click(&mut self, view: &BoardView) -> Option<Slot> {
        view.occupied().choose(&mut self.rng).copied()
    }
}

/// Works toward a planned triple. Each plan targets a real set with
/// probability `insight`, otherwise three random cards.
pub struct InsightStrategy {
    predicate: Arc<dyn MatchPredicate>,
    insight: f64,
    plan: Vec<Token>,
    rng: StdRng,
}

impl InsightStrategy {
    #[must_use]
    pub fn new(predicate: Arc<dyn MatchPredicate>, insight: f64, seed: u64) -> Self {
        Self {
            predicate,
            insight: insight.clamp(0.0, 1.0),
            plan: Vec::with_capacity(SET_SIZE),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn make_plan(&mut self, view: &BoardView) -> Vec<Token> {
        let occupied = view.occupied();
        if occupied.len() < SET_SIZE {
            return Vec::new();
        }
        let to_token = |slot: Slot| {
            view.slots[slot].map(|card| Token { slot, card })
        };

        if self.rng.random_bool(self.insight) {
            let cards: Vec<Card> = occupied.iter().filter_map(|&slot| view.slots[slot]).collect();
            let sets = self.predicate.find_matches(&cards, usize::MAX);
            if let Some(set) = sets.choose(&mut self.rng) {
                return set
                    .iter()
                    .filter_map(|card| {
                        let slot = view.slots.iter().position(|c| *c == Some(*card))?;
                        to_token(slot)
                    })
                    .collect();
            }
        }
        occupied
            .choose_multiple(&mut self.rng, SET_SIZE)
            .filter_map(|&slot| to_token(slot))
            .collect()
    }
}

impl Strategy for InsightStrategy {
    fn next_click(&mut self, view: &BoardView) -> Option<Slot> {
        if self.plan.is_empty() || !self.plan.iter().all(|token| view.holds(token)) {
            self.plan = self.make_plan(view);
        }

        // Take back anything outside the plan first.
        if let Some(&stray) = view
            .tokens
            .iter()
            .find(|slot| !self.plan.iter().any(|token| token.slot == **slot))
        {
            return Some(stray);
        }

        let next = self
            .plan
            .iter()
            .find(|token| !view.tokens.contains(&token.slot))
            .map(|token| token.slot);
        if next.is_none() {
            // Whole plan is down already and got nowhere; start over.
            self.plan.clear();
        }
        next
    }
}

impl std::fmt::Debug for InsightStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightStrategy")
            .field("insight", &self.insight)
            .field("plan", &self.plan)
            .finish()
    }
}
