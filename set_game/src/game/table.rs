//! The shared grid: slot/card bijection plus per-slot token placements.
//!
//! Cards are placed and removed only by the arbiter thread. Tokens are
//! placed by any agent thread and only ever lock the slot they touch.

use log::info;
use parking_lot::Mutex;
use rand::{Rng, seq::SliceRandom};
use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use super::{
    entities::{Card, PlayerId, Slot, Token},
    predicate::MatchPredicate,
};
use crate::{display::DisplaySink, errors::TableError};

#[derive(Debug, Default)]
struct SlotCell {
    card: Option<Card>,
    tokens: BTreeSet<PlayerId>,
}

/// A card taken off the table, with the actors that had a token on it at
/// the moment of removal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedCard {
    pub slot: Slot,
    pub card: Card,
    pub holders: Vec<PlayerId>,
}

pub struct Table {
    slots: Vec<Mutex<SlotCell>>,
    /// Reverse mapping. Also serves as the mutation lock: it is held for the
    /// whole of every card placement/removal, always before a slot lock.
    card_to_slot: Mutex<Vec<Option<Slot>>>,
    card_count: AtomicUsize,
    display: Arc<dyn DisplaySink>,
    delay: Duration,
}

impl Table {
    pub fn new(
        table_size: usize,
        deck_size: usize,
        display: Arc<dyn DisplaySink>,
        delay: Duration,
    ) -> Self {
        Self {
            slots: (0..table_size).map(|_| Mutex::default()).collect(),
            card_to_slot: Mutex::new(vec![None; deck_size]),
            card_count: AtomicUsize::new(0),
            display,
            delay,
        }
    }

    pub fn table_size(&self) -> usize {
        self.slots.len()
    }

    fn cell(&self, slot: Slot) -> Result<&Mutex<SlotCell>, TableError> {
        self.slots.get(slot).ok_or(TableError::SlotOutOfRange(slot))
    }

    fn pace(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    /// Put a card into an empty slot.
    ///
    /// # Errors
    ///
    /// Fails if the slot or card is out of range, the slot is taken, or the
    /// card already sits elsewhere on the table.
    pub fn place_card(&self, card: Card, slot: Slot) -> Result<(), TableError> {
        self.pace();
        let mut card_to_slot = self.card_to_slot.lock();
        let cell = self.cell(slot)?;
        match card_to_slot.get(card) {
            None => return Err(TableError::CardOutOfRange(card)),
            Some(Some(at)) => return Err(TableError::CardAlreadyPlaced { card, slot: *at }),
            Some(None) => {}
        }

        let mut cell = cell.lock();
        if let Some(occupant) = cell.card {
            return Err(TableError::SlotOccupied {
                slot,
                card: occupant,
            });
        }
        cell.card = Some(card);
        card_to_slot[card] = Some(slot);
        self.card_count.fetch_add(1, Ordering::SeqCst);
        self.display.place_card(card, slot);
        Ok(())
    }

    /// Take the card out of a slot, dropping every token on it.
    ///
    /// Returns `None` if the slot was already empty or does not exist.
    pub fn remove_card(&self, slot: Slot) -> Option<RemovedCard> {
        self.pace();
        let mut card_to_slot = self.card_to_slot.lock();
        let mut cell = self.cell(slot).ok()?.lock();
        let card = cell.card.take()?;
        if let Some(entry) = card_to_slot.get_mut(card) {
            *entry = None;
        }
        let holders: Vec<PlayerId> = std::mem::take(&mut cell.tokens).into_iter().collect();
        self.card_count.fetch_sub(1, Ordering::SeqCst);

        if !holders.is_empty() {
            self.display.remove_tokens(slot);
        }
        self.display.remove_card(slot);
        Some(RemovedCard {
            slot,
            card,
            holders,
        })
    }

    /// Record a token on a slot if it currently holds a card.
    ///
    /// Never waits for a card mutation to finish on other slots; losing a
    /// race against a removal just returns `None`.
    pub fn place_token(&self, player: PlayerId, slot: Slot) -> Option<Token> {
        let mut cell = self.cell(slot).ok()?.lock();
        let card = cell.card?;
        if cell.tokens.insert(player) {
            self.display.place_token(player, slot);
        }
        Some(Token { slot, card })
    }

    /// Returns true if the player had a token on the slot.
    pub fn remove_token(&self, player: PlayerId, slot: Slot) -> bool {
        let Ok(cell) = self.cell(slot) else {
            return false;
        };
        let removed = cell.lock().tokens.remove(&player);
        if removed {
            self.display.remove_token(player, slot);
        }
        removed
    }

    pub fn is_slot_empty(&self, slot: Slot) -> bool {
        self.slot_to_card(slot).is_none()
    }

    pub fn slot_to_card(&self, slot: Slot) -> Option<Card> {
        self.slots.get(slot).and_then(|cell| cell.lock().card)
    }

    pub fn card_to_slot(&self, card: Card) -> Option<Slot> {
        self.card_to_slot.lock().get(card).copied().flatten()
    }

    pub fn card_count(&self) -> usize {
        self.card_count.load(Ordering::SeqCst)
    }

    pub fn empty_slot_count(&self) -> usize {
        self.table_size() - self.card_count()
    }

    pub fn empty_slots(&self) -> Vec<Slot> {
        (0..self.table_size())
            .filter(|&slot| self.is_slot_empty(slot))
            .collect()
    }

    pub fn occupied_slots(&self) -> Vec<Slot> {
        (0..self.table_size())
            .filter(|&slot| !self.is_slot_empty(slot))
            .collect()
    }

    /// Snapshot of the grid, one entry per slot.
    pub fn snapshot(&self) -> Vec<Option<Card>> {
        self.slots.iter().map(|cell| cell.lock().card).collect()
    }

    pub fn cards_on_table(&self) -> Vec<Card> {
        self.snapshot().into_iter().flatten().collect()
    }

    pub fn tokens_on(&self, slot: Slot) -> Vec<PlayerId> {
        self.slots
            .get(slot)
            .map(|cell| cell.lock().tokens.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn tokens_of(&self, player: PlayerId) -> Vec<Slot> {
        (0..self.table_size())
            .filter(|&slot| self.slots[slot].lock().tokens.contains(&player))
            .collect()
    }

    /// Remove every card, in random slot order, and hand them back.
    pub fn clear<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Card> {
        let mut order = self.occupied_slots();
        order.shuffle(rng);
        order
            .into_iter()
            .filter_map(|slot| self.remove_card(slot))
            .map(|removed| removed.card)
            .collect()
    }

    /// Log every set currently on the table.
    pub fn hints(&self, predicate: &dyn MatchPredicate) {
        let cards = self.cards_on_table();
        for set in predicate.find_matches(&cards, usize::MAX) {
            let mut slots: Vec<Slot> = set
                .iter()
                .filter_map(|&card| self.card_to_slot(card))
                .collect();
            slots.sort_unstable();
            let features: Vec<Vec<usize>> =
                set.iter().map(|&card| predicate.features(card)).collect();
            info!("Hint: Set found: slots: {slots:?} features: {features:?}");
        }
    }

    /// Whether `slot -> card` and `card -> slot` agree everywhere, and the
    /// card count matches. Taken under the mutation lock.
    pub fn check_invariant(&self) -> bool {
        let card_to_slot = self.card_to_slot.lock();
        let mut placed = 0;
        for (slot, cell) in self.slots.iter().enumerate() {
            if let Some(card) = cell.lock().card {
                placed += 1;
                if card_to_slot.get(card).copied().flatten() != Some(slot) {
                    return false;
                }
            }
        }
        let reverse_ok = card_to_slot.iter().enumerate().all(|(card, slot)| match slot {
            Some(slot) => self
                .slots
                .get(*slot)
                .is_some_and(|cell| cell.lock().card == Some(card)),
            None => true,
        });
        reverse_ok && placed == self.card_count()
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("slots", &self.snapshot())
            .field("card_count", &self.card_count())
            .finish()
    }
}
