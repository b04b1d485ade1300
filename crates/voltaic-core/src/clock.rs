//! Fixed-cadence tick clock.
//!
//! The host feeds wall-clock deltas; the clock reports how many fixed ticks
//! are due and carries the remainder to the next call.

use std::time::Duration;

/// Interval between distribution ticks unless configured otherwise.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

const NANOS_PER_SEC: u128 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    interval: Duration,
    /// Elapsed time not yet spent on a tick. Always below `interval`.
    accumulator: Duration,
}

impl TickClock {
    /// A clock ticking every `interval`. A zero interval is raised to one
    /// nanosecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_nanos(1)),
            accumulator: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Add `dt` and return the number of ticks now due. Counts beyond
    /// `u32::MAX` are dropped; the remainder is kept either way.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        let elapsed = self.accumulator.saturating_add(dt).as_nanos();
        let interval = self.interval.as_nanos();
        let rest = elapsed % interval;
        self.accumulator = Duration::new(
            (rest / NANOS_PER_SEC) as u64,
            (rest % NANOS_PER_SEC) as u32,
        );
        u32::try_from(elapsed / interval).unwrap_or(u32::MAX)
    }

    /// Time until the next tick is due.
    pub fn until_next(&self) -> Duration {
        self.interval - self.accumulator
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_half_second() {
        assert_eq!(TickClock::default().interval(), Duration::from_millis(500));
    }

    #[test]
    fn remainder_carries_over() {
        let mut clock = TickClock::default();
        assert_eq!(clock.advance(Duration::from_millis(300)), 0);
        assert_eq!(clock.advance(Duration::from_millis(300)), 1);
        assert_eq!(clock.until_next(), Duration::from_millis(400));
        assert_eq!(clock.advance(Duration::from_millis(1400)), 3);
        assert_eq!(clock.until_next(), Duration::from_millis(500));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut clock = TickClock::new(Duration::ZERO);
        assert_eq!(clock.interval(), Duration::from_nanos(1));
        assert_eq!(clock.advance(Duration::from_nanos(3)), 3);
    }

    #[test]
    fn huge_delta_saturates_without_looping() {
        let mut clock = TickClock::new(Duration::from_nanos(1));
        assert_eq!(clock.advance(Duration::from_secs(5)), u32::MAX);
        assert_eq!(clock.until_next(), Duration::from_nanos(1));

        let mut clock = TickClock::new(Duration::from_millis(300));
        assert_eq!(clock.advance(Duration::from_millis(100)), 0);
        assert_eq!(clock.advance(Duration::MAX), u32::MAX);
        assert!(clock.until_next() <= Duration::from_millis(300));
        assert!(clock.until_next() > Duration::ZERO);
    }
}
