//! Player agents.
//!
//! Each agent runs its state machine on a dedicated thread. The rest of the
//! game talks to it only through an [`AgentHandle`]: clicks, claim
//! notifications and pause/resume/terminate requests go into its mailbox,
//! and its state, score and freeze countdown are published through atomics
//! that only the agent thread writes.

mod mailbox;
mod states;

use log::{debug, info, warn};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    dealer::{arbiter::ClaimArbiter, rendezvous::PauseBarrier},
    display::DisplaySink,
    errors::{AgentDump, GameError, GameResult},
    game::{
        constants::SET_SIZE,
        entities::{
            ActorState, Claim, ClaimOutcome, PlayerId, PlayerKind, RoundVersion, Slot, Token,
        },
        table::Table,
    },
};
use mailbox::{Control, Mailbox};
use states::{Phase, StateHandler};

#[derive(Debug)]
struct AgentShared {
    mailbox: Mailbox,
    state: AtomicU8,
    score: AtomicU32,
    freeze_remaining_ms: AtomicU64,
}

/// Shared view of one agent.
#[derive(Clone, Debug)]
pub struct AgentHandle {
    id: PlayerId,
    name: String,
    kind: PlayerKind,
    shared: Arc<AgentShared>,
    table: Arc<Table>,
}

impl AgentHandle {
    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    pub fn state(&self) -> ActorState {
        ActorState::from_u8(self.shared.state.load(Ordering::SeqCst))
            .unwrap_or(ActorState::Terminated)
    }

    pub fn score(&self) -> u32 {
        self.shared.score.load(Ordering::SeqCst)
    }

    /// Slots this agent currently has a token on.
    pub fn tokens(&self) -> Vec<Slot> {
        self.table.tokens_of(self.id)
    }

    /// Queue a slot click. Dropped unless the agent is waiting for activity.
    pub fn key_pressed(&self, slot: Slot) -> bool {
        if !self.state().accepts_input() {
            return false;
        }
        self.shared.mailbox.push_click(slot);
        true
    }

    pub fn has_pending_clicks(&self) -> bool {
        self.shared.mailbox.pending_clicks() > 0
    }

    pub(crate) fn notify(&self, claim: Claim) {
        self.shared.mailbox.push_notification(claim);
    }

    pub(crate) fn request_pause(&self, generation: u64) {
        self.shared.mailbox.push_control(Control::Pause(generation));
    }

    pub(crate) fn resume(&self) {
        self.shared.mailbox.push_control(Control::Resume);
    }

    pub fn terminate(&self) {
        self.shared.mailbox.terminate();
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.mailbox.is_terminated()
    }

    /// Park until the agent is told to terminate or `deadline` passes.
    pub(crate) fn wait_terminated(&self, deadline: Instant) -> bool {
        self.shared.mailbox.wait_terminated(deadline)
    }

    pub fn dump(&self) -> AgentDump {
        AgentDump {
            player: self.id,
            name: self.name.clone(),
            state: self.state(),
            score: self.score(),
            tokens: self.tokens(),
            pending_clicks: self.shared.mailbox.pending_clicks(),
            pending_notifications: self.shared.mailbox.pending_notifications(),
            freeze_remainder_ms: self.shared.freeze_remaining_ms.load(Ordering::SeqCst),
        }
    }
}

/// Everything an agent thread needs from the rest of the game.
#[derive(Clone)]
pub struct AgentContext {
    pub table: Arc<Table>,
    pub arbiter: Arc<ClaimArbiter>,
    pub barrier: Arc<PauseBarrier>,
    pub display: Arc<dyn DisplaySink>,
    pub point_freeze: Duration,
    pub penalty_freeze: Duration,
}

/// Start an agent thread. The agent begins `Paused` and waits for a resume.
///
/// # Errors
///
/// Fails if the OS refuses to spawn the thread.
pub fn spawn_agent(
    id: PlayerId,
    name: String,
    kind: PlayerKind,
    context: AgentContext,
) -> GameResult<(AgentHandle, JoinHandle<()>)> {
    let shared = Arc::new(AgentShared {
        mailbox: Mailbox::default(),
        state: AtomicU8::new(ActorState::Paused as u8),
        score: AtomicU32::new(0),
        freeze_remaining_ms: AtomicU64::new(0),
    });
    let handle = AgentHandle {
        id,
        name: name.clone(),
        kind,
        shared: Arc::clone(&shared),
        table: Arc::clone(&context.table),
    };
    let worker = AgentWorker {
        id,
        name,
        shared,
        context,
        tokens: Vec::with_capacity(SET_SIZE),
        observed: 0,
        pending_claim: None,
        freeze_remainder: Duration::ZERO,
        pause_generation: None,
    };
    let thread_name = format!("player-{id}");
    let join = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || worker.run())
        .map_err(|source| GameError::Spawn {
            name: thread_name,
            source,
        })?;
    Ok((handle, join))
}

/// State owned by the agent thread.
pub(crate) struct AgentWorker {
    id: PlayerId,
    name: String,
    shared: Arc<AgentShared>,
    context: AgentContext,
    tokens: Vec<Token>,
    observed: RoundVersion,
    pending_claim: Option<RoundVersion>,
    freeze_remainder: Duration,
    pause_generation: Option<u64>,
}

impl AgentWorker {
    fn run(mut self) {
        info!("Player {} ({}) thread started", self.id, self.name);
        let mut state = ActorState::Paused;
        loop {
            self.set_state(state);
            let next = Phase::from(state).run(&mut self);
            if state == ActorState::Terminated {
                break;
            }
            if next != state {
                debug!("Player {}: {state} -> {next}", self.id);
            }
            state = next;
        }
        info!("Player {} ({}) thread terminated", self.id, self.name);
    }

    fn set_state(&self, state: ActorState) {
        self.shared.state.store(state as u8, Ordering::SeqCst);
    }

    fn mailbox(&self) -> &Mailbox {
        &self.shared.mailbox
    }

    /// Place a token, or take it back if the slot already has ours.
    /// Returns true if a new token was placed.
    fn toggle_token(&mut self, slot: Slot) -> bool {
        self.reconcile_tokens();
        if let Some(idx) = self.tokens.iter().position(|token| token.slot == slot) {
            let token = self.tokens.remove(idx);
            self.context.table.remove_token(self.id, token.slot);
            return false;
        }
        if self.tokens.len() >= SET_SIZE {
            return false;
        }
        match self.context.table.place_token(self.id, slot) {
            Some(token) => {
                self.tokens.push(token);
                true
            }
            None => false,
        }
    }

    /// Drop tokens whose slot no longer holds the card they were put on.
    fn reconcile_tokens(&mut self) {
        let table = &self.context.table;
        self.tokens
            .retain(|token| table.slot_to_card(token.slot) == Some(token.card));
    }

    fn clear_tokens(&mut self) {
        for token in self.tokens.drain(..) {
            self.context.table.remove_token(self.id, token.slot);
        }
    }

    /// Take in a claim notification. Returns the freeze to serve if it was
    /// the verdict on our own pending claim.
    fn absorb(&mut self, claim: &Claim) -> Option<Duration> {
        if claim.claimer == self.id && self.pending_claim == Some(claim.version) {
            self.pending_claim = None;
            return Some(self.settle_own(claim.outcome()));
        }
        if claim.is_valid() {
            self.tokens.retain(|token| !claim.contains_card(token.card));
        }
        self.reconcile_tokens();
        None
    }

    fn settle_own(&mut self, outcome: ClaimOutcome) -> Duration {
        match outcome {
            ClaimOutcome::Valid => {
                let score = self.shared.score.fetch_add(1, Ordering::SeqCst) + 1;
                self.context.display.set_score(self.id, score);
                info!("Player {} found a set, score {score}", self.id);
                self.clear_tokens();
                self.context.point_freeze
            }
            outcome if outcome.is_penalty() => {
                debug!("Player {} claimed a non-set", self.id);
                self.context.penalty_freeze
            }
            ClaimOutcome::Invalid(_) | ClaimOutcome::Pending => {
                self.reconcile_tokens();
                Duration::ZERO
            }
        }
    }

    fn enter_freeze(&mut self, freeze: Duration) -> ActorState {
        if freeze.is_zero() {
            return ActorState::WaitingForActivity;
        }
        self.freeze_remainder = freeze;
        ActorState::Frozen
    }

    /// Returns the next state if the request leaves the current one.
    fn handle_control(&mut self, control: Control) -> Option<ActorState> {
        match control {
            Control::Pause(generation) => {
                self.pause_generation = Some(generation);
                Some(ActorState::PausingExecution)
            }
            Control::Resume => None,
        }
    }

    fn publish_freeze(&self, remaining: Duration) {
        let ms = remaining.as_millis() as u64;
        self.shared.freeze_remaining_ms.store(ms, Ordering::SeqCst);
        self.context.display.set_freeze(self.id, ms);
    }

    fn acknowledge_pause(&mut self) {
        if let Some(generation) = self.pause_generation.take() {
            self.context.barrier.acknowledge(self.id, generation);
        }
    }

    fn forget_pending_claim(&mut self) {
        if let Some(version) = self.pending_claim.take() {
            warn!(
                "Player {} paused with claim v{version} still unresolved",
                self.id
            );
        }
    }
}
