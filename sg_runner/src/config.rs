//! Runner configuration management.
//!
//! Layers the game configuration: built-in defaults, then an optional JSON
//! file, then `SET_*` environment variables, then command-line flags.

use set_game::{BotDifficulty, GameConfig};
use std::path::Path;

/// Flags given on the command line. They win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub humans: Option<usize>,
    pub bots: Option<usize>,
    pub timeout_millis: Option<i64>,
    pub seed: Option<u64>,
}

/// Load the game configuration.
///
/// # Errors
///
/// Returns error if the config file cannot be read or parsed, or if the
/// combined configuration is invalid.
pub fn load(config_path: Option<&Path>, cli: &CliOverrides) -> Result<GameConfig, ConfigError> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("SET_CONFIG").ok().map(Into::into));

    let base = match path {
        Some(path) => {
            let json = std::fs::read_to_string(&path).map_err(|e| ConfigError::Invalid {
                var: path.display().to_string(),
                reason: format!("cannot read config file: {e}"),
            })?;
            GameConfig::from_json_str(&json)?
        }
        None => GameConfig::default(),
    };

    let mut config = apply_env(base, |key| std::env::var(key).ok())?;
    apply_cli(&mut config, cli);
    config.validate()?;
    Ok(config)
}

/// Apply `SET_*` variables found through `lookup` on top of `config`.
fn apply_env(
    mut config: GameConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<GameConfig, ConfigError> {
    config.human_players = parse_env_or(&lookup, "SET_HUMANS", config.human_players);
    config.computer_players = parse_env_or(&lookup, "SET_BOTS", config.computer_players);
    config.turn_timeout_millis =
        parse_env_or(&lookup, "SET_TIMEOUT_MILLIS", config.turn_timeout_millis);
    config.turn_timeout_warning_millis = parse_env_or(
        &lookup,
        "SET_WARNING_MILLIS",
        config.turn_timeout_warning_millis,
    );
    config.point_freeze_millis =
        parse_env_or(&lookup, "SET_POINT_FREEZE_MILLIS", config.point_freeze_millis);
    config.penalty_freeze_millis = parse_env_or(
        &lookup,
        "SET_PENALTY_FREEZE_MILLIS",
        config.penalty_freeze_millis,
    );
    config.hints = parse_env_or(&lookup, "SET_HINTS", config.hints);

    if let Some(seed) = lookup("SET_SEED") {
        config.shuffle_seed = Some(seed.parse().map_err(|_| ConfigError::Invalid {
            var: "SET_SEED".to_string(),
            reason: format!("'{seed}' is not an unsigned integer"),
        })?);
    }

    if let Some(difficulty) = lookup("SET_BOT_DIFFICULTY") {
        config.bot_difficulty =
            difficulty
                .parse::<BotDifficulty>()
                .map_err(|e| ConfigError::Invalid {
                    var: "SET_BOT_DIFFICULTY".to_string(),
                    reason: e.to_string(),
                })?;
    }

    if let Some(names) = lookup("SET_PLAYER_NAMES") {
        config.player_names = names
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
    }

    Ok(config)
}

fn apply_cli(config: &mut GameConfig, cli: &CliOverrides) {
    if let Some(humans) = cli.humans {
        config.human_players = humans;
    }
    if let Some(bots) = cli.bots {
        config.computer_players = bots;
    }
    if let Some(timeout) = cli.timeout_millis {
        config.turn_timeout_millis = timeout;
        // A short countdown would otherwise trip the default warning bound.
        if timeout > 0 {
            config.turn_timeout_warning_millis =
                config.turn_timeout_warning_millis.min(timeout as u64);
        }
    }
    if cli.seed.is_some() {
        config.shuffle_seed = cli.seed;
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Game(#[from] set_game::ConfigError),
}

/// Helper to parse a variable with default fallback
fn parse_env_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = apply_env(
            GameConfig::default(),
            env(&[
                ("SET_HUMANS", "1"),
                ("SET_BOTS", "5"),
                ("SET_TIMEOUT_MILLIS", "-1"),
                ("SET_SEED", "42"),
                ("SET_BOT_DIFFICULTY", "Sharp"),
                ("SET_PLAYER_NAMES", "Ada, Grace,"),
            ]),
        )
        .unwrap();

        assert_eq!(config.human_players, 1);
        assert_eq!(config.computer_players, 5);
        assert_eq!(config.turn_timeout_millis, -1);
        assert_eq!(config.shuffle_seed, Some(42));
        assert_eq!(config.bot_difficulty, BotDifficulty::Sharp);
        assert_eq!(config.player_names, vec!["Ada", "Grace"]);
    }

    #[test]
    fn test_unparsable_number_keeps_default() {
        let config = apply_env(GameConfig::default(), env(&[("SET_BOTS", "many")])).unwrap();
        assert_eq!(config.computer_players, GameConfig::default().computer_players);
    }

    #[test]
    fn test_bad_seed_rejected() {
        let err = apply_env(GameConfig::default(), env(&[("SET_SEED", "-3")])).unwrap_err();
        assert!(err.to_string().contains("SET_SEED"));
    }

    #[test]
    fn test_bad_difficulty_rejected() {
        let err =
            apply_env(GameConfig::default(), env(&[("SET_BOT_DIFFICULTY", "tag")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_cli_wins_over_env() {
        let mut config = apply_env(GameConfig::default(), env(&[("SET_HUMANS", "4")])).unwrap();
        apply_cli(
            &mut config,
            &CliOverrides {
                humans: Some(0),
                bots: Some(3),
                timeout_millis: Some(2_000),
                seed: Some(9),
            },
        );
        assert_eq!(config.human_players, 0);
        assert_eq!(config.computer_players, 3);
        assert_eq!(config.turn_timeout_millis, 2_000);
        assert_eq!(config.turn_timeout_warning_millis, 2_000);
        assert_eq!(config.shuffle_seed, Some(9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "SET_SEED".to_string(),
            reason: "not a number".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SET_SEED"));
        assert!(msg.contains("not a number"));
    }
}
