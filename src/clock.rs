use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::util::whole_intervals;

/// One countdown step emitted by [`SessionClock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Arming generation this tick belongs to
    pub epoch: u64,
    /// Ticks still to come after this one; zero marks expiry
    pub remaining: u32,
}

impl Tick {
    pub fn is_expiry(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    epoch: u64,
    started_at: Instant,
    total: u32,
    delivered: u32,
}

/// Countdown timer polled by the event loop.
///
/// Ticks are scheduled from the start instant, so a slow consumer receives every
/// overdue tick on the next poll. Drift between polls is not corrected; a tick
/// is late by at most one poll interval.
#[derive(Debug, Clone)]
pub struct SessionClock {
    interval: Duration,
    armed: Option<Armed>,
    last_epoch: u64,
}

impl SessionClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            armed: None,
            last_epoch: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.armed.is_some()
    }

    /// Epoch of the current arming, if any
    pub fn epoch(&self) -> Option<u64> {
        self.armed.map(|a| a.epoch)
    }

    pub fn start(&mut self, duration_ticks: u32) -> Result<u64> {
        self.start_at(duration_ticks, Instant::now())
    }

    /// Arms the countdown. A zero duration or a zero interval could never
    /// reach its expiry tick, so both are refused.
    pub fn start_at(&mut self, duration_ticks: u32, now: Instant) -> Result<u64> {
        if self.armed.is_some() {
            return Err(Error::InvalidState("clock already running"));
        }
        if duration_ticks == 0 {
            return Err(Error::InvalidState("clock needs at least one tick"));
        }
        if self.interval.is_zero() {
            return Err(Error::InvalidState("clock interval must be non-zero"));
        }
        self.last_epoch += 1;
        self.armed = Some(Armed {
            epoch: self.last_epoch,
            started_at: now,
            total: duration_ticks,
            delivered: 0,
        });
        Ok(self.last_epoch)
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    /// Collect every tick due by `now`, in order. Disarms itself after the expiry tick.
    pub fn poll(&mut self, now: Instant) -> Vec<Tick> {
        let Some(mut armed) = self.armed else {
            return Vec::new();
        };

        let elapsed = now.saturating_duration_since(armed.started_at);
        let due = whole_intervals(elapsed, self.interval).min(armed.total as u64) as u32;

        let ticks: Vec<Tick> = (armed.delivered + 1..=due)
            .map(|n| Tick {
                epoch: armed.epoch,
                remaining: armed.total - n,
            })
            .collect();

        armed.delivered = due;
        self.armed = if armed.delivered >= armed.total {
            None
        } else {
            Some(armed)
        };

        ticks
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn start_twice_is_invalid_state() {
        let mut clock = SessionClock::default();
        let t0 = Instant::now();
        clock.start_at(15, t0).unwrap();
        assert!(matches!(
            clock.start_at(15, t0),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn zero_duration_or_interval_is_refused() {
        let t0 = Instant::now();
        let mut clock = SessionClock::default();
        assert!(matches!(clock.start_at(0, t0), Err(Error::InvalidState(_))));
        assert!(!clock.is_running());

        let mut clock = SessionClock::new(Duration::ZERO);
        assert!(matches!(clock.start_at(3, t0), Err(Error::InvalidState(_))));
        assert!(clock.poll(t0 + SEC).is_empty());
    }

    #[test]
    fn single_tick_round_expires_at_one_interval() {
        let mut clock = SessionClock::default();
        let t0 = Instant::now();
        let epoch = clock.start_at(1, t0).unwrap();
        assert_eq!(
            clock.poll(t0 + SEC),
            vec![Tick {
                epoch,
                remaining: 0
            }]
        );
        assert!(!clock.is_running());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut clock = SessionClock::default();
        clock.cancel();
        clock.start_at(3, Instant::now()).unwrap();
        clock.cancel();
        clock.cancel();
        assert!(!clock.is_running());
    }

    #[test]
    fn emits_one_tick_per_interval() {
        let mut clock = SessionClock::default();
        let t0 = Instant::now();
        let epoch = clock.start_at(3, t0).unwrap();

        assert!(clock.poll(t0 + Duration::from_millis(999)).is_empty());
        assert_eq!(
            clock.poll(t0 + SEC),
            vec![Tick {
                epoch,
                remaining: 2
            }]
        );
        // polling again within the same second yields nothing
        assert!(clock.poll(t0 + Duration::from_millis(1500)).is_empty());
    }

    #[test]
    fn slow_consumer_gets_every_overdue_tick_once() {
        let mut clock = SessionClock::default();
        let t0 = Instant::now();
        clock.start_at(5, t0).unwrap();

        let ticks = clock.poll(t0 + Duration::from_millis(3200));
        let remaining: Vec<u32> = ticks.iter().map(|t| t.remaining).collect();
        assert_eq!(remaining, vec![4, 3, 2]);

        let ticks = clock.poll(t0 + Duration::from_secs(4));
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].remaining, 1);
    }

    #[test]
    fn expiry_is_emitted_exactly_once_and_disarms() {
        let mut clock = SessionClock::default();
        let t0 = Instant::now();
        clock.start_at(2, t0).unwrap();

        let ticks = clock.poll(t0 + Duration::from_secs(10));
        assert_eq!(ticks.len(), 2);
        assert!(ticks[1].is_expiry());
        assert!(!clock.is_running());
        assert!(clock.poll(t0 + Duration::from_secs(20)).is_empty());
    }

    #[test]
    fn each_arming_gets_a_new_epoch() {
        let mut clock = SessionClock::default();
        let t0 = Instant::now();
        let first = clock.start_at(2, t0).unwrap();
        clock.cancel();
        let second = clock.start_at(2, t0).unwrap();
        assert!(second > first);
        assert_eq!(clock.epoch(), Some(second));
    }

    #[test]
    fn cancelled_clock_emits_nothing() {
        let mut clock = SessionClock::default();
        let t0 = Instant::now();
        clock.start_at(3, t0).unwrap();
        clock.cancel();
        assert!(clock.poll(t0 + Duration::from_secs(3)).is_empty());
    }

    #[test]
    fn drift_between_polls_is_bounded_by_poll_lateness() {
        // ticks stay anchored to the start instant no matter how late the polls arrive
        let mut clock = SessionClock::default();
        let t0 = Instant::now();
        clock.start_at(3, t0).unwrap();
        assert_eq!(clock.poll(t0 + Duration::from_millis(1900)).len(), 1);
        assert_eq!(clock.poll(t0 + Duration::from_millis(2001)).len(), 1);
    }
}
