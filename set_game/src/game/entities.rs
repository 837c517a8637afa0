use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::SET_SIZE;

/// Card identifier. Its features are owned by the predicate evaluator.
pub type Card = usize;

/// Index into the fixed-size grid of the table.
pub type Slot = usize;

/// Actor identifier, starting from 0. Humans come first.
pub type PlayerId = usize;

/// Identifies which arrangement of the table a claim was computed against.
/// Reset to 0 at the start of every round.
pub type RoundVersion = u64;

/// A marker an actor keeps on a slot while composing a claim.
///
/// The card is remembered alongside the slot so that a token can be
/// reconciled by card identity after the slot gets refilled.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Token {
    pub slot: Slot,
    pub card: Card,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.card, self.slot)
    }
}

/// Why the arbiter turned a claim down.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum InvalidReason {
    /// The three cards do not satisfy the matching predicate.
    NotAMatch,
    /// A slot was emptied or refilled between admission and processing.
    Superseded,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::NotAMatch => "not a set",
            Self::Superseded => "table changed underneath",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ClaimOutcome {
    Pending,
    Valid,
    Invalid(InvalidReason),
}

impl ClaimOutcome {
    /// An invalid outcome is only penalised when the claimer got the
    /// predicate wrong, never when someone else's claim got there first.
    #[must_use]
    pub fn is_penalty(&self) -> bool {
        matches!(self, Self::Invalid(InvalidReason::NotAMatch))
    }
}

impl fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Valid => write!(f, "valid"),
            Self::Invalid(reason) => write!(f, "invalid ({reason})"),
        }
    }
}

/// A submitted triple awaiting arbitration.
///
/// Everything but the outcome is fixed at construction; the outcome is set
/// exactly once by the arbiter.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Claim {
    pub tokens: [Token; SET_SIZE],
    pub claimer: PlayerId,
    pub version: RoundVersion,
    outcome: ClaimOutcome,
}

impl Claim {
    #[must_use]
    pub fn new(tokens: [Token; SET_SIZE], claimer: PlayerId, version: RoundVersion) -> Self {
        Self {
            tokens,
            claimer,
            version,
            outcome: ClaimOutcome::Pending,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> ClaimOutcome {
        self.outcome
    }

    /// Records the verdict. Returns false (and leaves the claim untouched)
    /// if a verdict was already recorded.
    pub fn resolve(&mut self, outcome: ClaimOutcome) -> bool {
        if self.outcome != ClaimOutcome::Pending || outcome == ClaimOutcome::Pending {
            return false;
        }
        self.outcome = outcome;
        true
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.outcome == ClaimOutcome::Valid
    }

    pub fn slots(&self) -> [Slot; SET_SIZE] {
        self.tokens.map(|token| token.slot)
    }

    pub fn cards(&self) -> [Card; SET_SIZE] {
        self.tokens.map(|token| token.card)
    }

    pub fn contains_card(&self, card: Card) -> bool {
        self.tokens.iter().any(|token| token.card == card)
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.tokens;
        write!(
            f,
            "claim by player {} [{a}, {b}, {c}] at v{}: {}",
            self.claimer, self.version, self.outcome
        )
    }
}

/// Lifecycle state of a player agent.
///
/// Written only by the owning agent thread; everyone else reads it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[repr(u8)]
pub enum ActorState {
    WaitingForActivity = 0,
    TurningInClaim = 1,
    WaitingForClaimResult = 2,
    Frozen = 3,
    PausingExecution = 4,
    Paused = 5,
    Terminated = 6,
}

impl ActorState {
    /// Every state, in discriminant order.
    pub const ALL: [ActorState; 7] = [
        Self::WaitingForActivity,
        Self::TurningInClaim,
        Self::WaitingForClaimResult,
        Self::Frozen,
        Self::PausingExecution,
        Self::Paused,
        Self::Terminated,
    ];

    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Whether the actor accepts slot clicks in this state.
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::WaitingForActivity)
    }
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::WaitingForActivity => "waiting for activity",
            Self::TurningInClaim => "turning in claim",
            Self::WaitingForClaimResult => "waiting for claim result",
            Self::Frozen => "frozen",
            Self::PausingExecution => "pausing execution",
            Self::Paused => "paused",
            Self::Terminated => "terminated",
        };
        write!(f, "{repr}")
    }
}

/// Human actors get their clicks from an input source, computer actors
/// from a strategy running on a dedicated thread.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Human,
    Computer,
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "Human"),
            Self::Computer => write!(f, "AI"),
        }
    }
}
