use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::session::RoundOutcome;
use crate::store::{ComparisonKey, ScoreRecord, ScoreStore};

/// What happened to a finished round's score
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Written as the player's new best
    Recorded { previous: Option<ScoreRecord> },
    /// Equal to or below the stored best; nothing written
    NotPersonalBest { best: ScoreRecord },
    /// No usable player id; nothing written
    SkippedNoIdentity,
    /// The store failed; the round simply is not recorded
    StorageFailed,
}

impl Submission {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Submission::Recorded { .. })
    }
}

/// A trimmed, non-empty player id or `MissingIdentity`
pub fn normalize_player_id(player_id: Option<&str>) -> Result<&str> {
    match player_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(Error::MissingIdentity),
    }
}

/// Decides whether a finished round becomes the player's stored best.
///
/// A score is written only when no record exists or the new value strictly
/// beats the stored one on the comparison key. Store failures are logged and
/// reported as [`Submission::StorageFailed`], never returned as errors.
#[derive(Debug)]
pub struct LeaderboardReconciler<S: ScoreStore> {
    store: S,
    key: ComparisonKey,
    top_n: usize,
    top: Vec<ScoreRecord>,
}

impl<S: ScoreStore> LeaderboardReconciler<S> {
    pub fn new(store: S, key: ComparisonKey, top_n: usize) -> Self {
        Self {
            store,
            key,
            top_n,
            top: Vec::new(),
        }
    }

    pub fn key(&self) -> ComparisonKey {
        self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached top-N view, as of the last successful refresh
    pub fn top(&self) -> &[ScoreRecord] {
        &self.top
    }

    pub fn submit(&mut self, player_id: Option<&str>, outcome: &RoundOutcome) -> Submission {
        self.submit_at(player_id, outcome, Local::now())
    }

    pub fn submit_at(
        &mut self,
        player_id: Option<&str>,
        outcome: &RoundOutcome,
        now: DateTime<Local>,
    ) -> Submission {
        let player_id = match normalize_player_id(player_id) {
            Ok(id) => id.to_string(),
            Err(e) => {
                debug!("skipping leaderboard write: {}", e);
                return Submission::SkippedNoIdentity;
            }
        };

        let candidate = ScoreRecord {
            player_id,
            best_taps: outcome.tap_count,
            best_tps: outcome.taps_per_second,
            flagged: outcome.is_flagged(),
            recorded_at: now,
        };

        let previous = match self.store.get_best(&candidate.player_id, self.key) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(player = %candidate.player_id, "failed to read personal best: {}", e);
                return Submission::StorageFailed;
            }
        };

        if let Some(best) = previous.as_ref() {
            if self.key.value_of(&candidate) <= self.key.value_of(best) {
                debug!(
                    player = %candidate.player_id,
                    new = self.key.value_of(&candidate),
                    best = self.key.value_of(best),
                    "not a personal best"
                );
                return Submission::NotPersonalBest { best: best.clone() };
            }
        }

        if let Err(e) = self.store.replace(&candidate) {
            warn!(player = %candidate.player_id, "failed to record score: {}", e);
            return Submission::StorageFailed;
        }

        info!(
            player = %candidate.player_id,
            taps = candidate.best_taps,
            tps = candidate.best_tps,
            key = %self.key,
            "new personal best recorded"
        );
        self.refresh_top();
        Submission::Recorded { previous }
    }

    /// Re-fetch the top-N view. On failure the previous view is kept.
    pub fn refresh_top(&mut self) -> bool {
        match self.store.get_top_n(self.top_n, self.key) {
            Ok(top) => {
                self.top = top;
                true
            }
            Err(e) => {
                warn!("failed to refresh leaderboard: {}", e);
                false
            }
        }
    }

    pub fn personal_best(&self, player_id: Option<&str>) -> Option<ScoreRecord> {
        let player_id = normalize_player_id(player_id).ok()?;
        match self.store.get_best(player_id, self.key) {
            Ok(best) => best,
            Err(e) => {
                warn!(player = %player_id, "failed to read personal best: {}", e);
                None
            }
        }
    }
}
