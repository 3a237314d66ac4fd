//! Configuration loading and management

mod io;
mod settings;

pub use settings::{
    CoordinatorSettings, EngineSettings, StorageSettings, MAX_STEP_GOAL, MIN_STEP_GOAL,
};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure (`~/.stepquest/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Progression rules
    #[serde(default)]
    pub engine: EngineSettings,

    /// Entity storage
    #[serde(default)]
    pub storage: StorageSettings,

    /// Coordinator queue settings
    #[serde(default)]
    pub coordinator: CoordinatorSettings,
}

impl Config {
    /// Database path, falling back to the global data directory
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("progress.db"))
    }
}
