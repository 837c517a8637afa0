//! Card model and shared table state.
//!
//! This module provides the passive pieces every thread reads or mutates:
//! - Card, slot, token and claim entities
//! - The matching predicate and its feature-vector implementation
//! - The table grid with its slot/card bijection
//! - The card supply with replenishment preferences

pub mod constants;
pub mod entities;
pub mod predicate;
pub mod supply;
pub mod table;

pub use entities::{
    ActorState, Card, Claim, ClaimOutcome, InvalidReason, PlayerId, PlayerKind, RoundVersion,
    Slot, Token,
};
pub use predicate::{FeatureMatcher, MatchPredicate};
pub use supply::CardSupply;
pub use table::{RemovedCard, Table};
