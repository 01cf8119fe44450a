use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::identity::IdentityProvider;
use crate::leaderboard::{normalize_player_id, LeaderboardReconciler, Submission};
use crate::platform::Platform;
use crate::session::RoundOutcome;
use crate::store::{ComparisonKey, MemoryScoreStore, ScoreRecord, ScoreStore, SqliteScoreStore};

/// Open the score database, degrading to an in-memory store if that fails
pub fn open_store(path: Option<&Path>) -> Box<dyn ScoreStore> {
    let opened = match path {
        Some(path) => SqliteScoreStore::open(path),
        None => SqliteScoreStore::open_default(),
    };
    match opened {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("leaderboard database unavailable, scores kept for this run only: {}", e);
            Box::new(MemoryScoreStore::new())
        }
    }
}

/// Collaborators a round needs once it finishes: who is playing, where scores
/// go, and the host platform.
pub struct GameContext<P: Platform> {
    identity: Box<dyn IdentityProvider>,
    leaderboard: LeaderboardReconciler<Box<dyn ScoreStore>>,
    platform: P,
}

impl<P: Platform> GameContext<P> {
    pub fn new(
        config: &Config,
        identity: Box<dyn IdentityProvider>,
        store: Box<dyn ScoreStore>,
        platform: P,
    ) -> Self {
        let mut leaderboard =
            LeaderboardReconciler::new(store, config.comparison_key, config.leaderboard_size);
        leaderboard.refresh_top();
        Self {
            identity,
            leaderboard,
            platform,
        }
    }

    pub fn accepts_input(&self) -> bool {
        self.platform.is_ready()
    }

    /// The id scores are filed under, in the same form the leaderboard stores it
    pub fn player_id(&self) -> Option<String> {
        let id = self.identity.player_id();
        normalize_player_id(id.as_deref()).ok().map(String::from)
    }

    /// Submit a finished round. The outcome itself is never altered.
    pub fn record(&mut self, outcome: &RoundOutcome) -> Submission {
        let player_id = self.player_id();
        let submission = self.leaderboard.submit(player_id.as_deref(), outcome);
        info!(?submission, "leaderboard submission");
        submission
    }

    pub fn share(&mut self, outcome: &RoundOutcome) {
        self.platform.share(&outcome.summary());
    }

    pub fn comparison_key(&self) -> ComparisonKey {
        self.leaderboard.key()
    }

    pub fn top(&self) -> &[ScoreRecord] {
        self.leaderboard.top()
    }

    pub fn personal_best(&self) -> Option<ScoreRecord> {
        self.leaderboard.personal_best(self.player_id().as_deref())
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::FixedIdentity;
    use crate::platform::TerminalPlatform;
    use crate::session::GameSession;
    use std::time::{Duration, Instant};

    fn context(player: Option<&str>) -> GameContext<TerminalPlatform> {
        GameContext::new(
            &Config::default(),
            Box::new(FixedIdentity(player.map(String::from))),
            Box::new(MemoryScoreStore::new()),
            TerminalPlatform::new(),
        )
    }

    fn play(taps: u32) -> RoundOutcome {
        let mut session = GameSession::default();
        let t0 = Instant::now();
        session.start_at(t0).unwrap();
        for _ in 0..taps {
            session.register_tap_at(t0);
        }
        session.poll(t0 + Duration::from_secs(15)).unwrap()
    }

    #[test]
    fn input_waits_for_platform() {
        let mut ctx = context(Some("ada"));
        assert!(!ctx.accepts_input());
        ctx.platform_mut().mark_ready();
        assert!(ctx.accepts_input());
    }

    #[test]
    fn records_through_identity() {
        let mut ctx = context(Some("ada"));
        assert!(ctx.record(&play(20)).is_recorded());
        assert_eq!(ctx.top().len(), 1);
        assert_eq!(ctx.personal_best().unwrap().best_taps, 20);
    }

    #[test]
    fn player_id_matches_the_stored_row() {
        struct Padded;
        impl IdentityProvider for Padded {
            fn player_id(&self) -> Option<String> {
                Some(" ada ".into())
            }
        }

        let mut ctx = GameContext::new(
            &Config::default(),
            Box::new(Padded),
            Box::new(MemoryScoreStore::new()),
            TerminalPlatform::new(),
        );
        ctx.record(&play(20));
        assert_eq!(ctx.player_id().as_deref(), Some("ada"));
        assert_eq!(Some(ctx.top()[0].player_id.clone()), ctx.player_id());
    }

    #[test]
    fn anonymous_rounds_still_have_outcomes() {
        let mut ctx = context(None);
        let outcome = play(20);
        assert_eq!(ctx.record(&outcome), Submission::SkippedNoIdentity);
        assert_eq!(outcome.tap_count, 20);
        assert!(ctx.top().is_empty());
    }

    #[test]
    fn share_hands_summary_to_platform() {
        let mut ctx = context(None);
        ctx.share(&play(45));
        assert_eq!(
            ctx.platform_mut().take_shared(),
            vec!["45 taps in 15s (3.00 taps/s) - rank: Turtle".to_string()]
        );
    }

    #[test]
    fn unopenable_database_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as a database file
        let mut store = open_store(Some(dir.path()));
        assert!(store.get_top_n(5, crate::store::ComparisonKey::Taps).is_ok());
        let record = ScoreRecord {
            player_id: "ada".into(),
            best_taps: 1,
            best_tps: 1.0 / 15.0,
            flagged: false,
            recorded_at: chrono::Local::now(),
        };
        assert!(store.replace(&record).is_ok());
    }
}
