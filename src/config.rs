use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::analyzer::AnalyzerConfig;
use crate::app_dirs::AppDirs;
use crate::rank::{default_tiers, RankTable, RankTier};
use crate::session::{SessionConfig, ROUND_DURATION_SECS};
use crate::store::ComparisonKey;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub round_secs: u32,
    pub player_id: Option<String>,
    pub comparison_key: ComparisonKey,
    pub leaderboard_size: usize,
    pub autoclicker: AnalyzerConfig,
    pub rank_tiers: Vec<RankTier>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            round_secs: ROUND_DURATION_SECS,
            player_id: None,
            comparison_key: ComparisonKey::Taps,
            leaderboard_size: 10,
            autoclicker: AnalyzerConfig::default(),
            rank_tiers: default_tiers(),
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            round_secs: self.round_secs,
            tick_interval: Duration::from_secs(1),
            analyzer: self.analyzer_config(),
        }
    }

    /// The configured autoclicker thresholds, or the defaults if they could never fire
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        match self.autoclicker.validate() {
            Ok(()) => self.autoclicker,
            Err(e) => {
                warn!("{}, using default autoclicker settings", e);
                AnalyzerConfig::default()
            }
        }
    }

    /// The configured tiers, or the defaults if they do not form a valid table
    pub fn rank_table(&self) -> RankTable {
        match RankTable::new(self.rank_tiers.clone()) {
            Ok(table) => table,
            Err(e) => {
                warn!("{}, using default tiers", e);
                RankTable::default()
            }
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> crate::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring unreadable config: {}", e);
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
