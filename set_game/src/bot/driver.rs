//! Bot driver thread: turns a strategy into paced clicks for one agent.

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::{
    models::DifficultyParams,
    strategy::{BoardView, Strategy},
};
use crate::{
    errors::{GameError, GameResult},
    game::{entities::ActorState, table::Table},
    player::AgentHandle,
};

pub struct BotDriver {
    agent: AgentHandle,
    table: Arc<Table>,
    strategy: Box<dyn Strategy>,
    params: DifficultyParams,
    rng: StdRng,
}

impl BotDriver {
    #[must_use]
    pub fn new(
        agent: AgentHandle,
        table: Arc<Table>,
        strategy: Box<dyn Strategy>,
        params: DifficultyParams,
        seed: u64,
    ) -> Self {
        Self {
            agent,
            table,
            strategy,
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Start clicking on a dedicated thread until the agent terminates.
    ///
    /// # Errors
    ///
    /// Fails if the OS refuses to spawn the thread.
    pub fn spawn(self) -> GameResult<JoinHandle<()>> {
        let name = format!("bot-{}", self.agent.id());
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run())
            .map_err(|source| GameError::Spawn { name, source })
    }

    fn run(mut self) {
        let id = self.agent.id();
        info!("Bot for player {id} started ({:?})", self.params);
        let mut clicks = 0u64;
        loop {
            let delay = Duration::from_millis(self.params.get_think_delay_ms(&mut self.rng));
            if self.agent.wait_terminated(Instant::now() + delay) {
                break;
            }
            if self.agent.state() != ActorState::WaitingForActivity || self.agent.has_pending_clicks()
            {
                continue;
            }
            let view = BoardView::capture(&self.table, id);
            if let Some(slot) = self.strategy.next_click(&view) {
                if self.agent.key_pressed(slot) {
                    clicks += 1;
                }
            }
        }
        debug!("Bot for player {id} clicked {clicks} times");
        info!("Bot for player {id} terminated");
    }
}
