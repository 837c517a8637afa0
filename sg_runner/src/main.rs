//! Headless Set game runner.
//!
//! Runs one game with a logging display. Human players click by writing
//! `player slot` lines to stdin; computer players play on their own.

mod config;
mod console;

use std::{io::BufRead, path::PathBuf, sync::Arc, thread};

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::{error, info, warn};
use pico_args::Arguments;
use set_game::{AgentHandle, FeatureMatcher, Game, GameError, PlayerId, PlayerKind, Slot};

use config::CliOverrides;
use console::LogDisplay;

const HELP: &str = "\
Run a headless Set game

USAGE:
  sg_runner [OPTIONS]

OPTIONS:
  --config     FILE        JSON game configuration  [default: env SET_CONFIG or built-in]
  --humans     N           Number of human players
  --bots       N           Number of computer players
  --timeout    MILLIS      >0 countdown, 0 elapsed clock, <0 untimed
  --seed       N           Deterministic deck shuffling

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SET_HUMANS, SET_BOTS, SET_TIMEOUT_MILLIS, SET_WARNING_MILLIS,
  SET_POINT_FREEZE_MILLIS, SET_PENALTY_FREEZE_MILLIS, SET_BOT_DIFFICULTY,
  SET_PLAYER_NAMES, SET_HINTS, SET_SEED
  RUST_LOG                 Log filter (e.g. info, debug)

INPUT:
  One click per line on stdin: `<player> <slot>`
";

struct Args {
    config: Option<PathBuf>,
    overrides: CliOverrides,
}

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        config: pargs.opt_value_from_str("--config")?,
        overrides: CliOverrides {
            humans: pargs.opt_value_from_str("--humans")?,
            bots: pargs.opt_value_from_str("--bots")?,
            timeout_millis: pargs.opt_value_from_str("--timeout")?,
            seed: pargs.opt_value_from_str("--seed")?,
        },
    };

    env_logger::builder().format_target(false).init();

    let config = config::load(args.config.as_deref(), &args.overrides)
        .context("Failed to load game configuration")?;
    let names = (0..config.player_count())
        .map(|player| config.player_name(player))
        .collect();
    let predicate = Arc::new(FeatureMatcher::new(
        config.feature_size,
        config.feature_count,
    ));
    let humans = config.human_players;

    let game = Game::start(config, Arc::new(LogDisplay::new(names)), predicate)?;

    // Catching signals for exit.
    let terminator = game.terminator();
    set_handler(move || terminator.terminate())?;

    if humans > 0 {
        spawn_input(game.agents().to_vec())?;
    }

    match game.join() {
        Ok(summary) => {
            info!("Game finished after {} rounds", summary.rounds);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(GameError::UnresponsiveActor {
            stuck,
            waited_ms,
            dump,
        }) => {
            error!("Players {stuck:?} did not pause within {waited_ms}ms");
            for entry in &dump {
                eprintln!("{entry}");
            }
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

/// Forward stdin clicks to the agents. The reader thread is left running;
/// it dies with the process.
fn spawn_input(agents: Vec<AgentHandle>) -> Result<(), Error> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_click(&line) {
                    Some((player, slot)) => match agents.get(player) {
                        Some(agent) if agent.kind() == PlayerKind::Human => {
                            if !agent.key_pressed(slot) {
                                info!("{} is not accepting clicks", agent.name());
                            }
                        }
                        _ => warn!("No human player {player}"),
                    },
                    None if line.trim().is_empty() => {}
                    None => warn!("Expected `<player> <slot>`, got {line:?}"),
                }
            }
        })?;
    Ok(())
}

fn parse_click(line: &str) -> Option<(PlayerId, Slot)> {
    let mut parts = line.split_whitespace();
    let player = parts.next()?.parse().ok()?;
    let slot = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((player, slot))
}
