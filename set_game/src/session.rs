//! Game wiring: builds the shared state, starts every thread and hands back
//! a handle to drive and observe the running game.

use log::info;
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use crate::{
    bot::{BotDriver, DifficultyParams, InsightStrategy, Strategy},
    config::GameConfig,
    dealer::{Dealer, GameSummary, arbiter::ClaimArbiter, rendezvous::PauseBarrier},
    display::DisplaySink,
    errors::{GameError, GameResult},
    game::{
        entities::{ActorState, PlayerId, PlayerKind, Slot},
        predicate::MatchPredicate,
        supply::CardSupply,
        table::Table,
    },
    player::{AgentContext, AgentHandle, spawn_agent},
};

/// Requests termination of a running game. Cheap to clone into signal
/// handlers.
#[derive(Clone, Debug)]
pub struct Terminator {
    arbiter: Arc<ClaimArbiter>,
}

impl Terminator {
    pub fn terminate(&self) {
        self.arbiter.shut_down();
    }
}

pub struct Game;

impl Game {
    /// Start a game whose computer players use the configured difficulty.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or if a thread cannot be spawned.
    pub fn start(
        config: GameConfig,
        display: Arc<dyn DisplaySink>,
        predicate: Arc<dyn MatchPredicate>,
    ) -> GameResult<GameHandle> {
        let insight = DifficultyParams::from_difficulty(config.bot_difficulty).insight_probability;
        let seed = config.shuffle_seed;
        let bot_predicate = Arc::clone(&predicate);
        Self::start_with(
            config,
            display,
            predicate,
            move |player| -> Box<dyn Strategy> {
                Box::new(InsightStrategy::new(
                    Arc::clone(&bot_predicate),
                    insight,
                    player_seed(seed, player),
                ))
            },
        )
    }

    /// Start a game, asking `strategy_for` for the strategy of each
    /// computer player.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or if a thread cannot be spawned.
    pub fn start_with<F>(
        config: GameConfig,
        display: Arc<dyn DisplaySink>,
        predicate: Arc<dyn MatchPredicate>,
        mut strategy_for: F,
    ) -> GameResult<GameHandle>
    where
        F: FnMut(PlayerId) -> Box<dyn Strategy>,
    {
        config.validate()?;
        info!(
            "Starting game: {} humans, {} bots, {:?}",
            config.human_players,
            config.computer_players,
            config.timer_mode()
        );

        let table = Arc::new(Table::new(
            config.table_size,
            config.deck_size,
            Arc::clone(&display),
            config.table_delay(),
        ));
        let supply = CardSupply::new(config.deck_size, config.shuffle_seed);
        let arbiter = Arc::new(ClaimArbiter::new());
        let barrier = Arc::new(PauseBarrier::new());
        let context = AgentContext {
            table: Arc::clone(&table),
            arbiter: Arc::clone(&arbiter),
            barrier: Arc::clone(&barrier),
            display: Arc::clone(&display),
            point_freeze: config.point_freeze(),
            penalty_freeze: config.penalty_freeze(),
        };

        let mut agents = Vec::with_capacity(config.player_count());
        let mut threads = Vec::new();
        for player in 0..config.player_count() {
            let kind = if config.is_human(player) {
                PlayerKind::Human
            } else {
                PlayerKind::Computer
            };
            match spawn_agent(player, config.player_name(player), kind, context.clone()) {
                Ok((handle, join)) => {
                    display.set_score(player, 0);
                    agents.push(handle);
                    threads.push((format!("player-{player}"), join));
                }
                Err(err) => return abort(&agents, err),
            }
        }

        let mut params = DifficultyParams::from_difficulty(config.bot_difficulty);
        if let Some(think_ms) = config.bot_think_millis {
            params = params.with_think_time(think_ms);
        }
        for agent in agents.iter().filter(|agent| agent.kind() == PlayerKind::Computer) {
            let driver = BotDriver::new(
                agent.clone(),
                Arc::clone(&table),
                strategy_for(agent.id()),
                params.clone(),
                player_seed(config.shuffle_seed, agent.id()),
            );
            match driver.spawn() {
                Ok(join) => threads.push((format!("bot-{}", agent.id()), join)),
                Err(err) => return abort(&agents, err),
            }
        }

        let dealer = Dealer::new(
            config,
            Arc::clone(&table),
            supply,
            predicate,
            Arc::clone(&arbiter),
            barrier,
            display,
            agents.clone(),
            threads,
        );
        let dealer = match thread::Builder::new()
            .name("dealer".to_string())
            .spawn(move || dealer.run())
        {
            Ok(join) => join,
            Err(source) => {
                return abort(
                    &agents,
                    GameError::Spawn {
                        name: "dealer".to_string(),
                        source,
                    },
                );
            }
        };

        Ok(GameHandle {
            agents,
            arbiter,
            table,
            dealer,
        })
    }
}

/// Stop whatever agents already started before bailing out.
fn abort<T>(agents: &[AgentHandle], err: GameError) -> GameResult<T> {
    agents.iter().for_each(AgentHandle::terminate);
    Err(err)
}

fn player_seed(seed: Option<u64>, player: PlayerId) -> u64 {
    match seed {
        Some(seed) => seed.wrapping_add(player as u64 + 1),
        None => rand::random(),
    }
}

/// A running game.
pub struct GameHandle {
    agents: Vec<AgentHandle>,
    arbiter: Arc<ClaimArbiter>,
    table: Arc<Table>,
    dealer: JoinHandle<GameResult<GameSummary>>,
}

impl GameHandle {
    /// Deliver a slot click for `player`. Returns false if the player does
    /// not exist or is not currently accepting input.
    pub fn key_pressed(&self, player: PlayerId, slot: Slot) -> bool {
        self.agents
            .get(player)
            .is_some_and(|agent| agent.key_pressed(slot))
    }

    pub fn terminator(&self) -> Terminator {
        Terminator {
            arbiter: Arc::clone(&self.arbiter),
        }
    }

    pub fn terminate(&self) {
        self.terminator().terminate();
    }

    pub fn agents(&self) -> &[AgentHandle] {
        &self.agents
    }

    pub fn agent(&self, player: PlayerId) -> Option<&AgentHandle> {
        self.agents.get(player)
    }

    pub fn scores(&self) -> Vec<u32> {
        self.agents.iter().map(AgentHandle::score).collect()
    }

    pub fn states(&self) -> Vec<ActorState> {
        self.agents.iter().map(AgentHandle::state).collect()
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn round_version(&self) -> u64 {
        self.arbiter.version()
    }

    pub fn is_finished(&self) -> bool {
        self.dealer.is_finished()
    }

    /// Wait for the dealer thread to wind the game down.
    ///
    /// # Errors
    ///
    /// Propagates the dealer's error, or reports a panicked dealer thread.
    pub fn join(self) -> GameResult<GameSummary> {
        self.dealer
            .join()
            .map_err(|_| GameError::ThreadPanicked("dealer".to_string()))?
    }
}
