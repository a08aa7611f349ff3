use crate::battle::BattleTuning;
use crate::mastery::MasteryWeights;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub language: String,
    /// League forced by the player; `None` selects by level.
    pub league: Option<String>,
    /// Per-question answer time limit; `None` disables the timer.
    pub time_limit_secs: Option<u64>,
    #[serde(default)]
    pub tuning: BattleTuning,
    #[serde(default)]
    pub weights: MasteryWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "spanish".to_string(),
            league: None,
            time_limit_secs: Some(15),
            tuning: BattleTuning::default(),
            weights: MasteryWeights::default(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "verbduel") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("verbduel_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
