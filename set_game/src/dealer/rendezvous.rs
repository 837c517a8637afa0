//! Pause rendezvous between the dealer and every agent.
//!
//! The dealer opens a generation, broadcasts a pause request carrying it,
//! and blocks until every agent acknowledged that generation from `Paused`.
//! Acknowledgements for an older generation are ignored.

use parking_lot::{Condvar, Mutex};
use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use crate::game::entities::PlayerId;

#[derive(Debug, Default)]
struct Acks {
    generation: u64,
    acked: BTreeSet<PlayerId>,
}

#[derive(Debug, Default)]
pub struct PauseBarrier {
    acks: Mutex<Acks>,
    arrived: Condvar,
}

impl PauseBarrier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pause generation and forget older acknowledgements.
    pub fn begin(&self) -> u64 {
        let mut acks = self.acks.lock();
        acks.generation += 1;
        acks.acked.clear();
        acks.generation
    }

    pub fn acknowledge(&self, player: PlayerId, generation: u64) {
        let mut acks = self.acks.lock();
        if acks.generation == generation && acks.acked.insert(player) {
            self.arrived.notify_all();
        }
    }

    /// Wait until all `players` acknowledged the current generation.
    ///
    /// # Errors
    ///
    /// Returns the players still missing when `timeout` runs out.
    pub fn wait_for(&self, players: &[PlayerId], timeout: Duration) -> Result<(), Vec<PlayerId>> {
        let deadline = Instant::now() + timeout;
        let mut acks = self.acks.lock();
        loop {
            let missing: Vec<PlayerId> = players
                .iter()
                .copied()
                .filter(|player| !acks.acked.contains(player))
                .collect();
            if missing.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(missing);
            }
            self.arrived.wait_until(&mut acks, deadline);
        }
    }
}
