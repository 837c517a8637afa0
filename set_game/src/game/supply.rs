//! The undealt cards.

use log::debug;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::VecDeque;

use super::{
    entities::Card,
    predicate::MatchPredicate,
};

#[derive(Debug)]
pub struct CardSupply {
    cards: VecDeque<Card>,
    rng: StdRng,
}

impl CardSupply {
    /// A full, shuffled deck. The same seed always yields the same order.
    #[must_use]
    pub fn new(deck_size: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut supply = Self {
            cards: (0..deck_size).collect(),
            rng,
        };
        supply.shuffle();
        supply
    }

    /// A supply holding exactly `cards`, in that order.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>, seed: u64) -> Self {
        Self {
            cards: cards.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn shuffle(&mut self) {
        self.cards.make_contiguous().shuffle(&mut self.rng);
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn give_back(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> Vec<Card> {
        self.cards.iter().copied().collect()
    }

    /// Random source shared with table clearing so a seed fixes the whole
    /// sequence of deals.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Draw up to `count` cards to refill the table.
    ///
    /// If the table already holds a set, the first cards are taken. Otherwise
    /// the draw is biased toward completing some set over table ∪ deck that
    /// needs at most `count` deck cards; if none exists, the first cards are
    /// taken anyway.
    pub fn draw_replenishment(
        &mut self,
        table_cards: &[Card],
        count: usize,
        predicate: &dyn MatchPredicate,
    ) -> Vec<Card> {
        let count = count.min(self.cards.len());
        if count == 0 {
            return Vec::new();
        }
        if predicate.find_any_match(table_cards).is_some() {
            return self.draw_first(count);
        }

        let pool: Vec<Card> = table_cards
            .iter()
            .copied()
            .chain(self.cards.iter().copied())
            .collect();
        let needed = predicate
            .find_matches(&pool, usize::MAX)
            .into_iter()
            .map(|set| {
                set.into_iter()
                    .filter(|card| !table_cards.contains(card))
                    .collect::<Vec<Card>>()
            })
            .find(|from_deck| from_deck.len() <= count);

        let Some(from_deck) = needed else {
            debug!("No set reachable with {count} new cards, dealing in order");
            return self.draw_first(count);
        };

        self.cards.retain(|card| !from_deck.contains(card));
        let mut drawn = from_deck;
        let rest = count - drawn.len();
        drawn.extend(self.draw_first(rest));
        drawn
    }

    fn draw_first(&mut self, count: usize) -> Vec<Card> {
        let count = count.min(self.cards.len());
        self.cards.drain(..count).collect()
    }
}
