//! Agent state handlers.
//!
//! Each state is a unit type that runs until it decides the next state.
//! Termination is checked on every wakeup, so it is reachable from all of
//! them.

use enum_dispatch::enum_dispatch;
use log::trace;
use rand::Rng;
use std::time::{Duration, Instant};

use super::{
    AgentWorker,
    mailbox::{Control, MailEvent},
};
use crate::{
    dealer::arbiter::SubmitOutcome,
    game::{
        constants::{FREEZE_DISPLAY_INTERVAL_MS, MAX_RETRY_WAIT_MS, MIN_RETRY_WAIT_MS, SET_SIZE},
        entities::{ActorState, Token},
    },
};

#[enum_dispatch]
pub(crate) trait StateHandler {
    /// Run this state until the agent has to move on.
    fn run(&self, worker: &mut AgentWorker) -> ActorState;
}

#[enum_dispatch(StateHandler)]
#[derive(Debug)]
pub(crate) enum Phase {
    WaitingForActivity,
    TurningInClaim,
    WaitingForClaimResult,
    Frozen,
    PausingExecution,
    Paused,
    Terminated,
}

impl From<ActorState> for Phase {
    fn from(value: ActorState) -> Self {
        match value {
            ActorState::WaitingForActivity => WaitingForActivity.into(),
            ActorState::TurningInClaim => TurningInClaim.into(),
            ActorState::WaitingForClaimResult => WaitingForClaimResult.into(),
            ActorState::Frozen => Frozen.into(),
            ActorState::PausingExecution => PausingExecution.into(),
            ActorState::Paused => Paused.into(),
            ActorState::Terminated => Terminated.into(),
        }
    }
}

/// Accepting clicks and composing a claim
#[derive(Debug)]
pub(crate) struct WaitingForActivity;

/// Handing a complete triple to the arbiter
#[derive(Debug)]
pub(crate) struct TurningInClaim;

/// Claim admitted, waiting for the verdict
#[derive(Debug)]
pub(crate) struct WaitingForClaimResult;

/// Serving a point or penalty freeze
#[derive(Debug)]
pub(crate) struct Frozen;

/// Dropping in-flight work at round end
#[derive(Debug)]
pub(crate) struct PausingExecution;

/// Between rounds
#[derive(Debug)]
pub(crate) struct Paused;

#[derive(Debug)]
pub(crate) struct Terminated;

impl StateHandler for WaitingForActivity {
    fn run(&self, worker: &mut AgentWorker) -> ActorState {
        loop {
            match worker.mailbox().next(true, None) {
                Some(MailEvent::Terminate) | None => return ActorState::Terminated,
                Some(MailEvent::Notification(claim)) => {
                    if let Some(freeze) = worker.absorb(&claim) {
                        return worker.enter_freeze(freeze);
                    }
                }
                Some(MailEvent::Control(control)) => {
                    if let Some(next) = worker.handle_control(control) {
                        return next;
                    }
                }
                Some(MailEvent::Click(slot)) => {
                    if worker.toggle_token(slot) && worker.tokens.len() == SET_SIZE {
                        // Clicks queued behind the third token belong to the
                        // table this claim is about to change.
                        worker.mailbox().clear_clicks();
                        worker.observed = worker.context.arbiter.version();
                        return ActorState::TurningInClaim;
                    }
                }
            }
        }
    }
}

impl StateHandler for TurningInClaim {
    fn run(&self, worker: &mut AgentWorker) -> ActorState {
        loop {
            worker.reconcile_tokens();
            let Ok(tokens) = <[Token; SET_SIZE]>::try_from(worker.tokens.as_slice()) else {
                return ActorState::WaitingForActivity;
            };

            let backoff_until = match worker
                .context
                .arbiter
                .submit(worker.id, tokens, worker.observed)
            {
                SubmitOutcome::Accepted(version) => {
                    worker.pending_claim = Some(version);
                    return ActorState::WaitingForClaimResult;
                }
                SubmitOutcome::Stale { current } => {
                    trace!(
                        "Player {} retrying claim against v{current}",
                        worker.id
                    );
                    let wait = rand::rng().random_range(MIN_RETRY_WAIT_MS..=MAX_RETRY_WAIT_MS);
                    Some(Instant::now() + Duration::from_millis(wait))
                }
                // Round is closing; sit tight until the pause arrives.
                SubmitOutcome::Closed => None,
            };

            // Drain notifications first: someone else's commit may have
            // taken our cards, in which case there is nothing to resubmit.
            loop {
                match worker.mailbox().next(false, backoff_until) {
                    None => break,
                    Some(MailEvent::Terminate) => return ActorState::Terminated,
                    Some(MailEvent::Notification(claim)) => {
                        if let Some(freeze) = worker.absorb(&claim) {
                            return worker.enter_freeze(freeze);
                        }
                        if worker.tokens.len() < SET_SIZE {
                            return ActorState::WaitingForActivity;
                        }
                    }
                    Some(MailEvent::Control(control)) => {
                        if let Some(next) = worker.handle_control(control) {
                            return next;
                        }
                    }
                    Some(MailEvent::Click(_)) => {}
                }
            }
            worker.observed = worker.context.arbiter.version();
        }
    }
}

impl StateHandler for WaitingForClaimResult {
    fn run(&self, worker: &mut AgentWorker) -> ActorState {
        loop {
            match worker.mailbox().next(false, None) {
                Some(MailEvent::Terminate) | None => return ActorState::Terminated,
                Some(MailEvent::Notification(claim)) => {
                    if let Some(freeze) = worker.absorb(&claim) {
                        return worker.enter_freeze(freeze);
                    }
                }
                Some(MailEvent::Control(control)) => {
                    if let Some(next) = worker.handle_control(control) {
                        return next;
                    }
                }
                Some(MailEvent::Click(_)) => {}
            }
        }
    }
}

impl StateHandler for Frozen {
    fn run(&self, worker: &mut AgentWorker) -> ActorState {
        let mut deadline = Instant::now() + worker.freeze_remainder;
        loop {
            let now = Instant::now();
            if now >= deadline {
                worker.freeze_remainder = Duration::ZERO;
                worker.publish_freeze(Duration::ZERO);
                return ActorState::WaitingForActivity;
            }
            let remaining = deadline - now;
            worker.publish_freeze(remaining);

            let wake = now + remaining.min(Duration::from_millis(FREEZE_DISPLAY_INTERVAL_MS));
            match worker.mailbox().next(false, Some(wake)) {
                None | Some(MailEvent::Click(_)) => {}
                Some(MailEvent::Terminate) => return ActorState::Terminated,
                Some(MailEvent::Notification(claim)) => {
                    if let Some(freeze) = worker.absorb(&claim) {
                        deadline = deadline.max(Instant::now() + freeze);
                    }
                }
                Some(MailEvent::Control(control)) => {
                    if let Some(next) = worker.handle_control(control) {
                        worker.freeze_remainder = deadline.saturating_duration_since(Instant::now());
                        return next;
                    }
                }
            }
        }
    }
}

impl StateHandler for PausingExecution {
    fn run(&self, worker: &mut AgentWorker) -> ActorState {
        worker.clear_tokens();
        worker.mailbox().clear_clicks();

        // A verdict on our own claim may still be queued; its freeze carries
        // over into the next round.
        while let Some(event) = worker.mailbox().try_next(false) {
            match event {
                MailEvent::Terminate => return ActorState::Terminated,
                MailEvent::Notification(claim) => {
                    if let Some(freeze) = worker.absorb(&claim) {
                        worker.freeze_remainder = worker.freeze_remainder.max(freeze);
                    }
                }
                MailEvent::Control(Control::Pause(generation)) => {
                    worker.pause_generation = Some(generation);
                }
                MailEvent::Control(Control::Resume) | MailEvent::Click(_) => {}
            }
        }
        worker.clear_tokens();
        worker.forget_pending_claim();
        ActorState::Paused
    }
}

impl StateHandler for Paused {
    fn run(&self, worker: &mut AgentWorker) -> ActorState {
        worker.acknowledge_pause();
        loop {
            match worker.mailbox().next(false, None) {
                Some(MailEvent::Terminate) | None => return ActorState::Terminated,
                Some(MailEvent::Notification(claim)) => {
                    if let Some(freeze) = worker.absorb(&claim) {
                        worker.freeze_remainder = worker.freeze_remainder.max(freeze);
                    }
                }
                Some(MailEvent::Control(Control::Pause(generation))) => {
                    worker.context.barrier.acknowledge(worker.id, generation);
                }
                Some(MailEvent::Control(Control::Resume)) => {
                    worker.mailbox().clear_clicks();
                    return if worker.freeze_remainder.is_zero() {
                        ActorState::WaitingForActivity
                    } else {
                        ActorState::Frozen
                    };
                }
                Some(MailEvent::Click(_)) => {}
            }
        }
    }
}

impl StateHandler for Terminated {
    fn run(&self, worker: &mut AgentWorker) -> ActorState {
        worker.clear_tokens();
        worker.acknowledge_pause();
        ActorState::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_covers_every_state() {
        for state in ActorState::ALL {
            let phase = Phase::from(state);
            let name = format!("{phase:?}");
            assert_eq!(name.replace(['(', ')'], ""), format!("{state:?}").repeat(2));
        }
    }
}
