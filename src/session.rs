use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::analyzer::{AnalyzerConfig, TapTimingAnalyzer, TapWarning};
use crate::clock::{SessionClock, Tick};
use crate::error::{Error, Result};
use crate::rank::{RankTable, RankTier};
use crate::util::elapsed_ms;

pub const ROUND_DURATION_SECS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionStatus {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Round length in ticks (seconds with the default interval)
    pub round_secs: u32,
    pub tick_interval: Duration,
    pub analyzer: AnalyzerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_secs: ROUND_DURATION_SECS,
            tick_interval: Duration::from_secs(1),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

/// Frozen result of a finished round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub tap_count: u32,
    pub taps_per_second: f64,
    pub round_secs: u32,
    pub rank_index: usize,
    pub rank: RankTier,
    pub warning: Option<TapWarning>,
}

impl RoundOutcome {
    pub fn is_flagged(&self) -> bool {
        self.warning.is_some()
    }

    /// One-line summary handed to share sinks
    pub fn summary(&self) -> String {
        format!(
            "{} taps in {}s ({:.2} taps/s) - rank: {}",
            self.tap_count, self.round_secs, self.taps_per_second, self.rank.name
        )
    }
}

/// Transition callbacks; every method is optional
pub trait SessionObserver {
    fn on_start(&mut self, _round_secs: u32) {}
    fn on_tick(&mut self, _seconds_remaining: u32) {}
    fn on_warning(&mut self, _warning: &TapWarning) {}
    fn on_finish(&mut self, _outcome: &RoundOutcome) {}
}

/// The round state machine: Idle -> Running -> Finished, with reset back to Idle.
pub struct GameSession {
    config: SessionConfig,
    ranks: RankTable,
    status: SessionStatus,
    tap_count: u32,
    seconds_remaining: u32,
    clock: SessionClock,
    epoch: Option<u64>,
    started_at: Option<Instant>,
    analyzer: TapTimingAnalyzer,
    outcome: Option<RoundOutcome>,
    unreported: bool,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl GameSession {
    pub fn new(mut config: SessionConfig, ranks: RankTable) -> Self {
        // a zero-length round would never expire
        config.round_secs = config.round_secs.max(1);
        if config.tick_interval.is_zero() {
            warn!("zero tick interval, using one second");
            config.tick_interval = Duration::from_secs(1);
        }
        Self {
            clock: SessionClock::new(config.tick_interval),
            analyzer: TapTimingAnalyzer::new(config.analyzer),
            seconds_remaining: config.round_secs,
            config,
            ranks,
            status: SessionStatus::Idle,
            tap_count: 0,
            epoch: None,
            started_at: None,
            outcome: None,
            unreported: false,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn tap_count(&self) -> u32 {
        self.tap_count
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn round_secs(&self) -> u32 {
        self.config.round_secs
    }

    pub fn taps_per_second(&self) -> Option<f64> {
        self.outcome.as_ref().map(|o| o.taps_per_second)
    }

    pub fn outcome(&self) -> Option<&RoundOutcome> {
        self.outcome.as_ref()
    }

    pub fn warning(&self) -> Option<&TapWarning> {
        self.analyzer.warning()
    }

    pub fn start(&mut self) -> Result<()> {
        self.start_at(Instant::now())
    }

    /// Valid from Idle or Finished. A running round is left untouched.
    pub fn start_at(&mut self, now: Instant) -> Result<()> {
        if self.status == SessionStatus::Running {
            return Err(Error::InvalidState("round already running"));
        }

        self.clock.cancel();
        self.epoch = Some(self.clock.start_at(self.config.round_secs, now)?);
        self.tap_count = 0;
        self.seconds_remaining = self.config.round_secs;
        self.outcome = None;
        self.unreported = false;
        self.analyzer.reset();
        self.started_at = Some(now);
        self.status = SessionStatus::Running;

        info!(round_secs = self.config.round_secs, "round started");
        for observer in &mut self.observers {
            observer.on_start(self.config.round_secs);
        }
        Ok(())
    }

    pub fn register_tap(&mut self) -> bool {
        self.register_tap_at(Instant::now())
    }

    /// Counts the tap only while the round is live. Overdue ticks are applied
    /// first, so a tap past the deadline never lands in the finished round.
    pub fn register_tap_at(&mut self, now: Instant) -> bool {
        self.advance(now);

        if self.status != SessionStatus::Running || self.seconds_remaining == 0 {
            debug!(status = %self.status, "tap ignored");
            return false;
        }

        self.tap_count += 1;

        let at_ms = self.started_at.map_or(0, |start| elapsed_ms(start, now));
        if let Some(warning) = self.analyzer.record(at_ms) {
            warn!(tap = self.tap_count, "{}", warning);
            for observer in &mut self.observers {
                observer.on_warning(&warning);
            }
        }
        true
    }

    /// Apply due clock ticks. Returns the outcome once, on the call that observes the finish.
    pub fn poll(&mut self, now: Instant) -> Option<RoundOutcome> {
        self.advance(now);
        self.take_finished()
    }

    /// The outcome of a round that finished since the last call, if any
    pub fn take_finished(&mut self) -> Option<RoundOutcome> {
        if std::mem::take(&mut self.unreported) {
            self.outcome.clone()
        } else {
            None
        }
    }

    fn advance(&mut self, now: Instant) {
        for tick in self.clock.poll(now) {
            self.on_tick(tick);
        }
    }

    /// Ticks from a cancelled or earlier arming are dropped, and so is any tick
    /// that is not the next step of the countdown.
    pub(crate) fn on_tick(&mut self, tick: Tick) {
        let is_next = tick.remaining.checked_add(1) == Some(self.seconds_remaining);
        if self.status != SessionStatus::Running || self.epoch != Some(tick.epoch) || !is_next {
            debug!(
                epoch = tick.epoch,
                remaining = tick.remaining,
                "stale tick dropped"
            );
            return;
        }

        self.seconds_remaining = tick.remaining;
        for observer in &mut self.observers {
            observer.on_tick(self.seconds_remaining);
        }

        if self.seconds_remaining == 0 {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.clock.cancel();
        self.epoch = None;

        let taps_per_second = self.tap_count as f64 / self.config.round_secs as f64;
        let rank_index = self.ranks.index_of(taps_per_second);
        let outcome = RoundOutcome {
            tap_count: self.tap_count,
            taps_per_second,
            round_secs: self.config.round_secs,
            rank_index,
            rank: self.ranks.tiers()[rank_index].clone(),
            warning: self.analyzer.warning().copied(),
        };

        self.status = SessionStatus::Finished;
        self.unreported = true;
        info!(
            taps = outcome.tap_count,
            tps = outcome.taps_per_second,
            rank = %outcome.rank.name,
            flagged = outcome.is_flagged(),
            "round finished"
        );
        for observer in &mut self.observers {
            observer.on_finish(&outcome);
        }
        self.outcome = Some(outcome);
    }

    /// Back to Idle from any state; a pending tick can no longer land
    pub fn reset(&mut self) {
        self.clock.cancel();
        self.epoch = None;
        self.started_at = None;
        self.status = SessionStatus::Idle;
        self.tap_count = 0;
        self.seconds_remaining = self.config.round_secs;
        self.outcome = None;
        self.unreported = false;
        self.analyzer.reset();
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(SessionConfig::default(), RankTable::default())
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("status", &self.status)
            .field("tap_count", &self.tap_count)
            .field("seconds_remaining", &self.seconds_remaining)
            .field("epoch", &self.epoch)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}
