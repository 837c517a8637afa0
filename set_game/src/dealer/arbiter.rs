//! Claim admission and sequencing.
//!
//! Admission is an optimistic-concurrency check: a claim is admitted only if
//! it was composed against the current round version, and admitting it
//! advances the version. Admitted claims are handed to the dealer thread in
//! version order, so at most one claim ever exists per version value.
//!
//! The version gate and the claim queue have their own locks and no code
//! path holds both at once.

use log::{debug, trace};
use parking_lot::{Condvar, Mutex};
use std::{collections::BTreeMap, time::Duration};

use crate::game::{
    constants::SET_SIZE,
    entities::{Claim, PlayerId, RoundVersion, Token},
};

/// Result of handing a claim to the arbiter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    /// Queued for processing under this version.
    Accepted(RoundVersion),
    /// The table moved on since the claim was composed. Not a penalty.
    Stale { current: RoundVersion },
    /// The round is over and no more claims are taken.
    Closed,
}

#[derive(Debug)]
struct Gate {
    version: RoundVersion,
    open: bool,
}

#[derive(Debug, Default)]
struct Sequencer {
    pending: BTreeMap<RoundVersion, Claim>,
    next: RoundVersion,
    shutdown: bool,
}

#[derive(Debug)]
pub struct ClaimArbiter {
    gate: Mutex<Gate>,
    queue: Mutex<Sequencer>,
    wake: Condvar,
}

impl Default for ClaimArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimArbiter {
    /// A closed arbiter at version 0. Nothing is admitted until
    /// [`ClaimArbiter::open_round`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            gate: Mutex::new(Gate {
                version: 0,
                open: false,
            }),
            queue: Mutex::default(),
            wake: Condvar::new(),
        }
    }

    pub fn version(&self) -> RoundVersion {
        self.gate.lock().version
    }

    pub fn is_open(&self) -> bool {
        self.gate.lock().open
    }

    /// Admit a claim composed against `observed`.
    pub fn submit(
        &self,
        claimer: PlayerId,
        tokens: [Token; SET_SIZE],
        observed: RoundVersion,
    ) -> SubmitOutcome {
        let version = {
            let mut gate = self.gate.lock();
            if !gate.open {
                return SubmitOutcome::Closed;
            }
            if gate.version != observed {
                trace!(
                    "Stale claim from player {claimer}: observed v{observed}, current v{}",
                    gate.version
                );
                return SubmitOutcome::Stale {
                    current: gate.version,
                };
            }
            let version = gate.version;
            gate.version += 1;
            version
        };

        let claim = Claim::new(tokens, claimer, version);
        debug!("Admitted {claim}");
        self.queue.lock().pending.insert(version, claim);
        self.wake.notify_all();
        SubmitOutcome::Accepted(version)
    }

    /// Start a round at version 0 and begin admitting claims.
    pub(crate) fn open_round(&self) {
        let shutdown = {
            let mut queue = self.queue.lock();
            queue.pending.clear();
            queue.next = 0;
            queue.shutdown
        };
        let mut gate = self.gate.lock();
        gate.version = 0;
        gate.open = !shutdown;
    }

    /// Stop admitting claims. Already admitted ones still get processed.
    pub(crate) fn close_admission(&self) {
        self.gate.lock().open = false;
    }

    /// The next claim in version order, if it has been queued.
    pub(crate) fn next_ready(&self) -> Option<Claim> {
        let mut queue = self.queue.lock();
        let next = queue.next;
        let claim = queue.pending.remove(&next)?;
        queue.next += 1;
        Some(claim)
    }

    /// Whether every admitted claim has been handed out.
    pub(crate) fn caught_up(&self) -> bool {
        let admitted = self.gate.lock().version;
        self.queue.lock().next >= admitted
    }

    /// Block until a claim is ready, the arbiter shuts down, or `timeout`
    /// elapses.
    pub(crate) fn wait_for_claims(&self, timeout: Duration) {
        let mut queue = self.queue.lock();
        if queue.shutdown || queue.pending.contains_key(&queue.next) {
            return;
        }
        self.wake.wait_for(&mut queue, timeout);
    }

    /// Close admission for good and wake the dealer.
    pub fn shut_down(&self) {
        self.close_admission();
        self.queue.lock().shutdown = true;
        self.wake.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.queue.lock().shutdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::{sync::Arc, thread, time::Instant};

    fn tokens(base: usize) -> [Token; SET_SIZE] {
        [
            Token {
                slot: 0,
                card: base,
            },
            Token {
                slot: 1,
                card: base + 1,
            },
            Token {
                slot: 2,
                card: base + 2,
            },
        ]
    }

    fn open() -> ClaimArbiter {
        let arbiter = ClaimArbiter::new();
        arbiter.open_round();
        arbiter
    }

    #[test]
    fn test_closed_until_round_opens() {
        let arbiter = ClaimArbiter::new();
        assert_eq!(arbiter.submit(0, tokens(0), 0), SubmitOutcome::Closed);
        arbiter.open_round();
        assert_eq!(arbiter.submit(0, tokens(0), 0), SubmitOutcome::Accepted(0));
    }

    #[test]
    fn test_admission_bumps_version() {
        let arbiter = open();
        assert_eq!(arbiter.submit(0, tokens(0), 0), SubmitOutcome::Accepted(0));
        assert_eq!(arbiter.version(), 1);
        assert_eq!(
            arbiter.submit(1, tokens(0), 0),
            SubmitOutcome::Stale { current: 1 }
        );
        assert_eq!(arbiter.submit(1, tokens(0), 1), SubmitOutcome::Accepted(1));
        assert_eq!(arbiter.version(), 2);
    }

    #[test]
    fn test_claims_come_out_in_version_order() {
        let arbiter = open();
        for v in 0..5 {
            arbiter.submit(v as usize, tokens(v as usize), v);
        }
        let versions: Vec<_> = std::iter::from_fn(|| arbiter.next_ready())
            .map(|claim| claim.version)
            .collect();
        assert_eq!(versions, vec![0, 1, 2, 3, 4]);
        assert!(arbiter.caught_up());
    }

    #[test]
    fn test_caught_up_tracks_admissions() {
        let arbiter = open();
        assert!(arbiter.caught_up());
        arbiter.submit(0, tokens(0), 0);
        assert!(!arbiter.caught_up());
        arbiter.next_ready();
        assert!(arbiter.caught_up());
    }

    #[test]
    fn test_close_admission_keeps_queue() {
        let arbiter = open();
        arbiter.submit(0, tokens(0), 0);
        arbiter.close_admission();
        assert_eq!(arbiter.submit(1, tokens(3), 1), SubmitOutcome::Closed);
        assert_eq!(arbiter.next_ready().map(|claim| claim.claimer), Some(0));
    }

    #[test]
    fn test_open_round_resets_version() {
        let arbiter = open();
        arbiter.submit(0, tokens(0), 0);
        arbiter.submit(0, tokens(0), 1);
        arbiter.close_admission();
        while arbiter.next_ready().is_some() {}
        arbiter.open_round();
        assert_eq!(arbiter.version(), 0);
        assert_eq!(arbiter.submit(2, tokens(0), 0), SubmitOutcome::Accepted(0));
    }

    #[test]
    fn test_same_version_race_admits_exactly_one() {
        let arbiter = Arc::new(open());
        let handles: Vec<_> = (0..8)
            .map(|player| {
                let arbiter = Arc::clone(&arbiter);
                thread::spawn(move || arbiter.submit(player, tokens(0), 0))
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let accepted = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, SubmitOutcome::Accepted(0)))
            .count();
        assert_eq!(accepted, 1);
        assert!(
            outcomes
                .iter()
                .all(|outcome| matches!(
                    outcome,
                    SubmitOutcome::Accepted(0) | SubmitOutcome::Stale { current: 1 }
                ))
        );
        assert_eq!(arbiter.version(), 1);
    }

    #[test]
    fn test_wait_returns_immediately_when_ready() {
        let arbiter = open();
        arbiter.submit(0, tokens(0), 0);
        let start = Instant::now();
        arbiter.wait_for_claims(Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_shut_down_wakes_waiter() {
        let arbiter = Arc::new(open());
        let waiter = {
            let arbiter = Arc::clone(&arbiter);
            thread::spawn(move || {
                let start = Instant::now();
                arbiter.wait_for_claims(Duration::from_secs(10));
                start.elapsed()
            })
        };
        thread::sleep(Duration::from_millis(50));
        arbiter.shut_down();
        assert!(waiter.join().unwrap() < Duration::from_secs(5));
        assert_eq!(arbiter.submit(0, tokens(0), 0), SubmitOutcome::Closed);
        arbiter.open_round();
        assert!(!arbiter.is_open());
    }

    proptest! {
        #[test]
        fn test_accepted_versions_are_contiguous(
            attempts in prop::collection::vec((0usize..4, any::<bool>()), 1..40)
        ) {
            let arbiter = open();
            let mut accepted = Vec::new();
            for (player, fresh) in attempts {
                let current = arbiter.version();
                let observed = if fresh { current } else { current + 1 };
                match arbiter.submit(player, tokens(player * 3), observed) {
                    SubmitOutcome::Accepted(version) => {
                        prop_assert!(fresh);
                        prop_assert_eq!(version, current);
                        accepted.push(version);
                    }
                    SubmitOutcome::Stale { current: now } => {
                        prop_assert!(!fresh);
                        prop_assert_eq!(now, current);
                    }
                    SubmitOutcome::Closed => prop_assert!(false, "round is open"),
                }
            }
            let expected: Vec<RoundVersion> = (0..accepted.len() as RoundVersion).collect();
            prop_assert_eq!(&accepted, &expected);
            let drained: Vec<_> = std::iter::from_fn(|| arbiter.next_ready())
                .map(|claim| claim.version)
                .collect();
            prop_assert_eq!(drained, expected);
            prop_assert!(arbiter.caught_up());
        }
    }
}
