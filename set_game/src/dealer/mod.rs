//! The dealer thread: round lifecycle, claim processing and fan-out.
//!
//! The dealer is the only writer of card placements. Every round it deals,
//! opens claim admission, runs the clock while processing admitted claims
//! in version order, then closes admission, processes whatever is still
//! queued, pauses every agent and collects the cards back.

pub mod arbiter;
pub mod clock;
pub mod rendezvous;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    config::GameConfig,
    display::DisplaySink,
    errors::{GameError, GameResult},
    game::{
        constants::MIN_RETRY_WAIT_MS,
        entities::{ActorState, Card, Claim, ClaimOutcome, InvalidReason, PlayerId},
        predicate::MatchPredicate,
        supply::CardSupply,
        table::Table,
    },
    player::AgentHandle,
};
use arbiter::ClaimArbiter;
use clock::TurnClock;
use rendezvous::PauseBarrier;

/// Final standings of a game.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSummary {
    /// Score per player id
    pub scores: Vec<u32>,
    /// Every player holding the top score; empty if the game was terminated
    pub winners: Vec<PlayerId>,
    pub rounds: usize,
    /// True when the game ended because no set remained
    pub completed: bool,
}

/// Why a round stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RoundEnd {
    Timeout,
    NoSetOnTable,
    GameOver,
    Terminated,
}

pub struct Dealer {
    config: GameConfig,
    table: Arc<Table>,
    supply: CardSupply,
    predicate: Arc<dyn MatchPredicate>,
    arbiter: Arc<ClaimArbiter>,
    barrier: Arc<PauseBarrier>,
    display: Arc<dyn DisplaySink>,
    agents: Vec<AgentHandle>,
    threads: Vec<(String, JoinHandle<()>)>,
    clock: TurnClock,
    rounds: usize,
}

impl Dealer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: GameConfig,
        table: Arc<Table>,
        supply: CardSupply,
        predicate: Arc<dyn MatchPredicate>,
        arbiter: Arc<ClaimArbiter>,
        barrier: Arc<PauseBarrier>,
        display: Arc<dyn DisplaySink>,
        agents: Vec<AgentHandle>,
        threads: Vec<(String, JoinHandle<()>)>,
    ) -> Self {
        let clock = TurnClock::new(
            config.timer_mode(),
            Duration::from_millis(config.turn_timeout_warning_millis),
        );
        Self {
            config,
            table,
            supply,
            predicate,
            arbiter,
            barrier,
            display,
            agents,
            threads,
            clock,
            rounds: 0,
        }
    }

    /// Run rounds until no set remains or termination is requested, then
    /// stop every agent thread.
    ///
    /// # Errors
    ///
    /// Fails if an agent misses the pause rendezvous or an agent thread
    /// panicked.
    pub fn run(mut self) -> GameResult<GameSummary> {
        info!("Dealer thread started");
        let mut completed = false;
        while !self.arbiter.is_shut_down() {
            if self.game_over() {
                completed = true;
                break;
            }
            self.rounds += 1;
            self.deal();
            if self.config.hints {
                self.table.hints(self.predicate.as_ref());
            }

            self.arbiter.open_round();
            self.agents.iter().for_each(AgentHandle::resume);
            let end = self.run_round();
            debug!("Round {} ended: {end:?}", self.rounds);

            self.arbiter.close_admission();
            self.drain();
            if let Err(err) = self.pause_all() {
                self.agents.iter().for_each(AgentHandle::terminate);
                return Err(err);
            }
            self.reclaim();

            if end == RoundEnd::GameOver {
                completed = true;
                break;
            }
        }

        let winners = if completed {
            self.announce_winners()
        } else {
            Vec::new()
        };
        self.shutdown(winners, completed)
    }

    fn game_over(&self) -> bool {
        let mut cards = self.table.cards_on_table();
        cards.extend(self.supply.cards());
        self.predicate.find_any_match(&cards).is_none()
    }

    /// Fill every empty slot, preferring a draw that leaves a set showing.
    fn deal(&mut self) {
        let empty = self.table.empty_slots();
        let cards = self.supply.draw_replenishment(
            &self.table.cards_on_table(),
            empty.len(),
            self.predicate.as_ref(),
        );
        self.place(&empty, cards);
    }

    fn place(&mut self, slots: &[usize], cards: Vec<Card>) {
        let mut unplaced = Vec::new();
        for (&slot, card) in slots.iter().zip(cards) {
            if let Err(err) = self.table.place_card(card, slot) {
                error!("Failed to deal card {card} to slot {slot}: {err}");
                unplaced.push(card);
            }
        }
        self.supply.give_back(unplaced);
    }

    fn run_round(&mut self) -> RoundEnd {
        self.clock.start_round(Instant::now());
        loop {
            if self.arbiter.is_shut_down() {
                return RoundEnd::Terminated;
            }
            while let Some(claim) = self.arbiter.next_ready() {
                if self.process(claim) {
                    self.clock.reset(Instant::now());
                }
            }

            let now = Instant::now();
            self.clock.report(now, self.display.as_ref());
            if self.clock.expired(now) {
                return RoundEnd::Timeout;
            }
            if self.game_over() {
                return RoundEnd::GameOver;
            }
            if self.clock.reshuffles_on_dry_table()
                && self
                    .predicate
                    .find_any_match(&self.table.cards_on_table())
                    .is_none()
            {
                return RoundEnd::NoSetOnTable;
            }
            self.arbiter.wait_for_claims(self.clock.next_tick(now));
        }
    }

    /// Process every admitted claim. Admission must already be closed.
    fn drain(&mut self) {
        loop {
            while let Some(claim) = self.arbiter.next_ready() {
                self.process(claim);
            }
            if self.arbiter.caught_up() {
                return;
            }
            self.arbiter
                .wait_for_claims(Duration::from_millis(MIN_RETRY_WAIT_MS));
        }
    }

    /// Judge one claim, apply it to the table and tell everyone affected.
    /// Returns true if it was a valid set.
    fn process(&mut self, mut claim: Claim) -> bool {
        let superseded = claim
            .tokens
            .iter()
            .any(|token| self.table.slot_to_card(token.slot) != Some(token.card));
        let distinct = claim.slots().iter().collect::<BTreeSet<_>>().len() == claim.slots().len();
        let [a, b, c] = claim.cards();
        let outcome = if superseded || !distinct {
            ClaimOutcome::Invalid(InvalidReason::Superseded)
        } else if self.predicate.is_match(a, b, c) {
            ClaimOutcome::Valid
        } else {
            ClaimOutcome::Invalid(InvalidReason::NotAMatch)
        };
        claim.resolve(outcome);
        debug!("Processed {claim}");

        let mut recipients = BTreeSet::from([claim.claimer]);
        if claim.is_valid() {
            let slots = claim.slots();
            for slot in slots {
                if let Some(removed) = self.table.remove_card(slot) {
                    recipients.extend(removed.holders);
                }
            }
            let cards = self.supply.draw_replenishment(
                &self.table.cards_on_table(),
                slots.len(),
                self.predicate.as_ref(),
            );
            self.place(&slots, cards);
            recipients.extend(
                self.agents
                    .iter()
                    .filter(|agent| agent.state() == ActorState::WaitingForClaimResult)
                    .map(AgentHandle::id),
            );
        }

        for player in recipients {
            match self.agents.get(player) {
                Some(agent) => agent.notify(claim.clone()),
                None => warn!("No agent for player {player}"),
            }
        }
        claim.is_valid()
    }

    fn pause_all(&self) -> GameResult<()> {
        let generation = self.barrier.begin();
        for agent in &self.agents {
            agent.request_pause(generation);
        }
        let ids: Vec<PlayerId> = self.agents.iter().map(AgentHandle::id).collect();
        let bound = self.config.pause_rendezvous();
        self.barrier.wait_for(&ids, bound).map_err(|stuck| {
            let dump: Vec<_> = self.agents.iter().map(AgentHandle::dump).collect();
            error!("Players {stuck:?} did not pause within {}ms", bound.as_millis());
            for entry in &dump {
                error!("  {entry}");
            }
            GameError::UnresponsiveActor {
                stuck,
                waited_ms: bound.as_millis() as u64,
                dump,
            }
        })
    }

    fn reclaim(&mut self) {
        let cards = self.table.clear(self.supply.rng());
        self.supply.give_back(cards);
        self.supply.shuffle();
    }

    fn announce_winners(&self) -> Vec<PlayerId> {
        let top = self.agents.iter().map(AgentHandle::score).max().unwrap_or(0);
        let winners: Vec<PlayerId> = self
            .agents
            .iter()
            .filter(|agent| agent.score() == top)
            .map(AgentHandle::id)
            .collect();
        info!("Winners: {winners:?} with {top} points");
        self.display.announce_winners(&winners);
        if self.config.end_game_pause_millis > 0 {
            thread::sleep(Duration::from_millis(self.config.end_game_pause_millis));
        }
        winners
    }

    fn shutdown(self, winners: Vec<PlayerId>, completed: bool) -> GameResult<GameSummary> {
        self.arbiter.shut_down();
        // Highest id first, mirroring the order the agents were started in.
        for agent in self.agents.iter().rev() {
            agent.terminate();
        }
        let mut panicked = None;
        for (name, join) in self.threads.into_iter().rev() {
            if join.join().is_err() {
                error!("Thread {name} panicked");
                panicked.get_or_insert(name);
            }
        }
        info!("Dealer thread terminated after {} rounds", self.rounds);
        if let Some(name) = panicked {
            return Err(GameError::ThreadPanicked(name));
        }
        Ok(GameSummary {
            scores: self.agents.iter().map(AgentHandle::score).collect(),
            winners,
            rounds: self.rounds,
            completed,
        })
    }
}
