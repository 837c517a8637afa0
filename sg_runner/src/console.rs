//! Display sink that renders game notifications as log lines.

use log::{debug, info, trace, warn};
use set_game::{Card, DisplaySink, PlayerId, Slot};

pub struct LogDisplay {
    names: Vec<String>,
}

impl LogDisplay {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    fn name(&self, player: PlayerId) -> &str {
        self.names.get(player).map_or("?", String::as_str)
    }
}

impl DisplaySink for LogDisplay {
    fn set_score(&self, player: PlayerId, score: u32) {
        info!("{} has {score} point(s)", self.name(player));
    }

    fn set_freeze(&self, player: PlayerId, remaining_ms: u64) {
        if remaining_ms == 0 {
            debug!("{} is unfrozen", self.name(player));
        } else {
            trace!("{} frozen for {remaining_ms}ms", self.name(player));
        }
    }

    fn set_countdown(&self, remaining_ms: u64, warn: bool) {
        if warn {
            trace!("Reshuffle in {remaining_ms}ms");
        } else if remaining_ms % 10_000 < 1_000 {
            info!("Reshuffle in {}s", remaining_ms / 1000);
        }
    }

    fn set_elapsed(&self, elapsed_ms: u64) {
        trace!("Elapsed {}s", elapsed_ms / 1000);
    }

    fn place_card(&self, card: Card, slot: Slot) {
        debug!("Card {card} dealt to slot {slot}");
    }

    fn remove_card(&self, slot: Slot) {
        debug!("Slot {slot} cleared");
    }

    fn place_token(&self, player: PlayerId, slot: Slot) {
        debug!("{} marked slot {slot}", self.name(player));
    }

    fn remove_token(&self, player: PlayerId, slot: Slot) {
        debug!("{} unmarked slot {slot}", self.name(player));
    }

    fn remove_tokens(&self, slot: Slot) {
        trace!("All tokens on slot {slot} dropped");
    }

    fn announce_winners(&self, players: &[PlayerId]) {
        match players {
            [] => warn!("Game over without a winner"),
            [winner] => info!("{} wins!", self.name(*winner)),
            _ => {
                let names: Vec<&str> = players.iter().map(|&p| self.name(p)).collect();
                info!("It's a tie between {}", names.join(", "));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_player_has_placeholder_name() {
        let display = LogDisplay::new(vec!["Ada".to_string()]);
        assert_eq!(display.name(0), "Ada");
        assert_eq!(display.name(3), "?");
    }
}
