//! Round timing for the three clock modes.

use std::time::{Duration, Instant};

use crate::{
    config::TimerMode,
    display::DisplaySink,
    game::constants::{CLOCK_TICK_MS, CLOCK_WARNING_TICK_MS},
};

#[derive(Clone, Debug)]
pub struct TurnClock {
    mode: TimerMode,
    warning: Duration,
    started: Instant,
    deadline: Option<Instant>,
}

impl TurnClock {
    #[must_use]
    pub fn new(mode: TimerMode, warning: Duration) -> Self {
        let now = Instant::now();
        let mut clock = Self {
            mode,
            warning,
            started: now,
            deadline: None,
        };
        clock.start_round(now);
        clock
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn start_round(&mut self, now: Instant) {
        self.started = now;
        self.reset(now);
    }

    /// Restart the countdown. No effect in the other modes.
    pub fn reset(&mut self, now: Instant) {
        self.deadline = match self.mode {
            TimerMode::Countdown(timeout) => Some(now + timeout),
            TimerMode::Elapsed | TimerMode::Untimed => None,
        };
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Without a countdown, a round only ends once the table runs dry.
    pub fn reshuffles_on_dry_table(&self) -> bool {
        !matches!(self.mode, TimerMode::Countdown(_))
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn is_warning(&self, now: Instant) -> bool {
        self.remaining(now)
            .is_some_and(|remaining| remaining <= self.warning)
    }

    /// How long the dealer may sleep before the display needs refreshing.
    pub fn next_tick(&self, now: Instant) -> Duration {
        let tick = if self.is_warning(now) {
            Duration::from_millis(CLOCK_WARNING_TICK_MS)
        } else {
            Duration::from_millis(CLOCK_TICK_MS)
        };
        match self.remaining(now) {
            Some(remaining) if !remaining.is_zero() => tick.min(remaining),
            Some(_) => Duration::ZERO,
            None => tick,
        }
    }

    pub fn report(&self, now: Instant, display: &dyn DisplaySink) {
        match self.mode {
            TimerMode::Countdown(_) => {
                let remaining = self.remaining(now).unwrap_or_default();
                display.set_countdown(remaining.as_millis() as u64, self.is_warning(now));
            }
            TimerMode::Elapsed => display.set_elapsed(self.elapsed(now).as_millis() as u64),
            TimerMode::Untimed => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countdown(ms: u64, warn_ms: u64) -> TurnClock {
        TurnClock::new(
            TimerMode::Countdown(Duration::from_millis(ms)),
            Duration::from_millis(warn_ms),
        )
    }

    #[test]
    fn test_countdown_expires() {
        let now = Instant::now();
        let mut clock = countdown(1000, 100);
        clock.start_round(now);
        assert!(!clock.expired(now));
        assert!(clock.expired(now + Duration::from_millis(1000)));
        assert_eq!(
            clock.remaining(now + Duration::from_millis(400)),
            Some(Duration::from_millis(600))
        );
    }

    #[test]
    fn test_countdown_reset_extends_deadline() {
        let now = Instant::now();
        let mut clock = countdown(1000, 100);
        clock.start_round(now);
        clock.reset(now + Duration::from_millis(900));
        assert!(!clock.expired(now + Duration::from_millis(1500)));
    }

    #[test]
    fn test_warning_threshold_and_fast_ticks() {
        let now = Instant::now();
        let mut clock = countdown(1000, 100);
        clock.start_round(now);
        let late = now + Duration::from_millis(950);
        assert!(clock.is_warning(late));
        assert_eq!(clock.next_tick(late), Duration::from_millis(CLOCK_WARNING_TICK_MS));
        assert!(!clock.is_warning(now));
    }

    #[test]
    fn test_tick_never_overshoots_deadline() {
        let now = Instant::now();
        let mut clock = countdown(300, 0);
        clock.start_round(now);
        assert_eq!(clock.next_tick(now), Duration::from_millis(300));
        assert_eq!(clock.next_tick(now + Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_and_untimed_never_expire() {
        let now = Instant::now();
        for mode in [TimerMode::Elapsed, TimerMode::Untimed] {
            let mut clock = TurnClock::new(mode, Duration::ZERO);
            clock.start_round(now);
            assert!(!clock.expired(now + Duration::from_secs(3600)));
            assert!(clock.reshuffles_on_dry_table());
            assert_eq!(clock.next_tick(now), Duration::from_millis(CLOCK_TICK_MS));
        }
        assert!(!countdown(10, 0).reshuffles_on_dry_table());
    }
}
