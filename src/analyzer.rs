use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::error::{Error, Result};
use crate::util::mean;

/// Thresholds for the autoclicker heuristic.
///
/// The defaults are tuned to stay quiet for fast human tapping. A warning needs
/// either an implied rate above `max_tps` or at least `fast_count` intervals
/// shorter than `fast_interval_ms` in the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub window: usize,
    pub min_samples: usize,
    pub max_tps: f64,
    pub fast_interval_ms: u64,
    pub fast_count: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window: 8,
            min_samples: 6,
            max_tps: 41.0,
            fast_interval_ms: 20,
            fast_count: 6,
        }
    }
}

impl AnalyzerConfig {
    /// Rejects settings under which the warning could never fire
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidAnalyzerConfig(msg));
        if self.window == 0 {
            return invalid("window must hold at least one interval".into());
        }
        if self.min_samples == 0 || self.min_samples > self.window {
            return invalid(format!(
                "min_samples {} must be between 1 and window {}",
                self.min_samples, self.window
            ));
        }
        if self.fast_count == 0 || self.fast_count > self.window {
            return invalid(format!(
                "fast_count {} must be between 1 and window {}",
                self.fast_count, self.window
            ));
        }
        if !(self.max_tps.is_finite() && self.max_tps > 0.0) {
            return invalid(format!("max_tps {} must be positive", self.max_tps));
        }
        Ok(())
    }
}

/// Snapshot of the window at the moment the warning was raised
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapWarning {
    pub implied_tps: f64,
    pub fast_intervals: usize,
    pub samples: usize,
}

impl fmt::Display for TapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "suspicious tapping: {:.1} taps/s implied, {}/{} intervals too fast",
            self.implied_tps, self.fast_intervals, self.samples
        )
    }
}

/// Watches inter-tap intervals and raises a one-shot warning per round.
///
/// Purely observational: it never touches the tap counter.
#[derive(Debug, Clone)]
pub struct TapTimingAnalyzer {
    config: AnalyzerConfig,
    intervals: VecDeque<u64>,
    last_tap_ms: Option<u64>,
    warning: Option<TapWarning>,
}

impl TapTimingAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            intervals: VecDeque::with_capacity(config.window.max(1)),
            config,
            last_tap_ms: None,
            warning: None,
        }
    }

    pub fn reset(&mut self) {
        self.intervals.clear();
        self.last_tap_ms = None;
        self.warning = None;
    }

    /// Feed a tap timestamp (monotonic ms). Returns the warning only on the tap that raises it.
    pub fn record(&mut self, timestamp_ms: u64) -> Option<TapWarning> {
        let last = self.last_tap_ms.replace(timestamp_ms);
        let delta = timestamp_ms.saturating_sub(last?);

        self.intervals.push_back(delta);
        while self.intervals.len() > self.config.window {
            self.intervals.pop_front();
        }

        if self.warning.is_some() || self.intervals.len() < self.config.min_samples {
            return None;
        }

        let samples: Vec<f64> = self.intervals.iter().map(|&ms| ms as f64).collect();
        let avg_interval = mean(&samples)?;
        let implied_tps = if avg_interval > 0.0 {
            1000.0 / avg_interval
        } else {
            f64::INFINITY
        };
        let fast_intervals = self
            .intervals
            .iter()
            .filter(|&&ms| ms < self.config.fast_interval_ms)
            .count();

        if implied_tps > self.config.max_tps || fast_intervals >= self.config.fast_count {
            let warning = TapWarning {
                implied_tps,
                fast_intervals,
                samples: self.intervals.len(),
            };
            self.warning = Some(warning);
            return Some(warning);
        }

        None
    }

    pub fn warning(&self) -> Option<&TapWarning> {
        self.warning.as_ref()
    }

    pub fn is_flagged(&self) -> bool {
        self.warning.is_some()
    }

    pub fn samples(&self) -> usize {
        self.intervals.len()
    }
}

impl Default for TapTimingAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
