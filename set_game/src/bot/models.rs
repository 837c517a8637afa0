//! Bot player models and configuration.

use rand::Rng;

use crate::config::BotDifficulty;

/// Bot difficulty parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyParams {
    /// Chance (0.0 to 1.0) that a fresh plan targets a real set
    pub insight_probability: f64,

    /// Average thinking time per click in milliseconds (base)
    pub base_think_time_ms: u64,

    /// Random variance in thinking time (±milliseconds)
    pub think_time_variance_ms: u64,

    /// Floor for the randomised thinking time
    pub min_think_time_ms: u64,
}

impl DifficultyParams {
    /// Get parameters for Easy difficulty
    /// Slow, and mostly clicks at random
    pub fn easy() -> Self {
        Self {
            insight_probability: 0.2,    // Spots a set 20% of the time
            base_think_time_ms: 1500,    // Thinks ~1.5s base
            think_time_variance_ms: 700, // ±0.7s variance
            min_think_time_ms: 500,
        }
    }

    /// Get parameters for Standard difficulty
    pub fn standard() -> Self {
        Self {
            insight_probability: 0.5,
            base_think_time_ms: 1000,
            think_time_variance_ms: 500,
            min_think_time_ms: 300,
        }
    }

    /// Get parameters for Sharp difficulty
    /// Fast, and nearly always goes for a real set
    pub fn sharp() -> Self {
        Self {
            insight_probability: 0.95,
            base_think_time_ms: 600,
            think_time_variance_ms: 300,
            min_think_time_ms: 200,
        }
    }

    /// Get parameters for a given difficulty
    pub fn from_difficulty(difficulty: BotDifficulty) -> Self {
        match difficulty {
            BotDifficulty::Easy => Self::easy(),
            BotDifficulty::Standard => Self::standard(),
            BotDifficulty::Sharp => Self::sharp(),
        }
    }

    /// Same insight, different pace. Variance scales with the base.
    #[must_use]
    pub fn with_think_time(mut self, base_ms: u64) -> Self {
        self.base_think_time_ms = base_ms;
        self.think_time_variance_ms = base_ms / 2;
        self.min_think_time_ms = 1;
        self
    }

    /// Get thinking delay in milliseconds (with randomization)
    pub fn get_think_delay_ms<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let variance = rng.random_range(0..=self.think_time_variance_ms);
        let sign = if rng.random_bool(0.5) { 1 } else { -1 };

        let delay = self.base_think_time_ms as i64 + (variance as i64 * sign);
        delay.max(self.min_think_time_ms as i64) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_difficulty_presets_increase_insight() {
        let easy = DifficultyParams::easy();
        let standard = DifficultyParams::standard();
        let sharp = DifficultyParams::sharp();

        assert!(easy.insight_probability < standard.insight_probability);
        assert!(standard.insight_probability < sharp.insight_probability);
        assert!(easy.base_think_time_ms > sharp.base_think_time_ms);
    }

    #[test]
    fn test_from_difficulty() {
        assert_eq!(
            DifficultyParams::from_difficulty(BotDifficulty::Sharp),
            DifficultyParams::sharp()
        );
    }

    #[test]
    fn test_think_delay_within_bounds() {
        let params = DifficultyParams::standard();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let delay = params.get_think_delay_ms(&mut rng);
            assert!(delay >= params.min_think_time_ms);
            assert!(delay <= params.base_think_time_ms + params.think_time_variance_ms);
        }
    }

    #[test]
    fn test_think_time_override() {
        let params = DifficultyParams::easy().with_think_time(4);
        assert_eq!(params.insight_probability, 0.2);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let delay = params.get_think_delay_ms(&mut rng);
            assert!((1..=6).contains(&delay));
        }
    }
}
