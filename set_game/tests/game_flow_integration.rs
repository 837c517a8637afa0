//! Whole-game tests driven by computer players.

mod common;

use common::{RecordingDisplay, join_within};
use set_game::{
    BotDifficulty, FeatureMatcher, Game, GameConfig, GameError, NullDisplay, PlayerId,
    bot::{RandomStrategy, Strategy},
};
use std::{sync::Arc, time::Duration};

fn bots_config(bots: usize, seed: u64) -> GameConfig {
    GameConfig {
        human_players: 0,
        computer_players: bots,
        turn_timeout_millis: -1,
        turn_timeout_warning_millis: 0,
        point_freeze_millis: 0,
        penalty_freeze_millis: 0,
        bot_difficulty: BotDifficulty::Sharp,
        bot_think_millis: Some(2),
        shuffle_seed: Some(seed),
        ..Default::default()
    }
}

// ============================================================================
// Natural completion
// ============================================================================

#[test]
fn test_bot_game_runs_to_completion() {
    let display = Arc::new(RecordingDisplay::default());
    let game = Game::start(
        bots_config(3, 11),
        display.clone(),
        Arc::new(FeatureMatcher::default()),
    )
    .unwrap();

    let (result, finished) = join_within(game, Duration::from_secs(60));
    assert!(finished, "bots never exhausted the deck");
    let summary = result.unwrap();
    assert!(summary.completed);

    let top = summary.scores.iter().copied().max().unwrap();
    assert!(top > 0);
    let expected: Vec<PlayerId> = (0..summary.scores.len())
        .filter(|&player| summary.scores[player] == top)
        .collect();
    assert_eq!(summary.winners, expected);
    assert_eq!(display.winners(), Some(expected));

    // At most 81 / 3 sets can ever be collected.
    assert!(summary.scores.iter().sum::<u32>() <= 27);
}

#[test]
fn test_small_deck_game_completes() {
    // Two features of three values: nine cards, a 6-slot table.
    let config = GameConfig {
        deck_size: 9,
        table_size: 6,
        feature_count: 2,
        ..bots_config(2, 3)
    };
    let game = Game::start(
        config,
        Arc::new(NullDisplay),
        Arc::new(FeatureMatcher::new(3, 2)),
    )
    .unwrap();

    let (result, finished) = join_within(game, Duration::from_secs(30));
    assert!(finished);
    let summary = result.unwrap();
    assert!(summary.completed);
    assert!(!summary.winners.is_empty());
}

#[test]
fn test_random_clickers_never_corrupt_the_table() {
    let config = GameConfig {
        turn_timeout_millis: 400,
        penalty_freeze_millis: 20,
        ..bots_config(4, 5)
    };
    let game = Game::start_with(
        config,
        Arc::new(NullDisplay),
        Arc::new(FeatureMatcher::default()),
        |player| -> Box<dyn Strategy> { Box::new(RandomStrategy::new(player as u64)) },
    )
    .unwrap();

    for _ in 0..20 {
        std::thread::sleep(Duration::from_millis(50));
        assert!(game.table().check_invariant());
        for agent in game.agents() {
            assert!(agent.tokens().len() <= 3);
        }
    }

    let table = Arc::clone(game.table());
    game.terminate();
    let summary = game.join().unwrap();
    assert!(!summary.completed);
    assert!(table.check_invariant());
}

// ============================================================================
// Round churn
// ============================================================================

#[test]
fn test_short_rounds_pause_cleanly() {
    let config = GameConfig {
        turn_timeout_millis: 150,
        bot_think_millis: Some(20),
        ..bots_config(3, 21)
    };
    let game = Game::start(
        config,
        Arc::new(NullDisplay),
        Arc::new(FeatureMatcher::default()),
    )
    .unwrap();

    let (result, _) = join_within(game, Duration::from_secs(2));
    match result {
        Ok(summary) => assert!(summary.rounds > 1, "only {} rounds", summary.rounds),
        Err(GameError::UnresponsiveActor { stuck, dump, .. }) => {
            panic!("players {stuck:?} missed the pause: {dump:?}")
        }
        Err(err) => panic!("unexpected error: {err}"),
    }
}

#[test]
fn test_mixed_humans_and_bots() {
    let config = GameConfig {
        human_players: 1,
        turn_timeout_millis: 2_000,
        ..bots_config(2, 9)
    };
    let game = Game::start(
        config,
        Arc::new(NullDisplay),
        Arc::new(FeatureMatcher::default()),
    )
    .unwrap();

    assert!(common::wait_until(Duration::from_secs(10), || {
        game.scores()[1..].iter().sum::<u32>() >= 2
    }));
    assert_eq!(game.scores()[0], 0, "the idle human never scores");

    game.terminate();
    let summary = game.join().unwrap();
    assert!(summary.winners.is_empty());
}
