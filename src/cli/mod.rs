//! CLI command implementations

pub mod challenge;
pub mod feed;
pub mod group;
pub mod init;
pub mod pet;
pub mod premium;
pub mod quest;
pub mod status;
pub mod wipe;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use stepquest::coordinator::{AutoConfirm, StaticEntitlement};
use stepquest::{Config, Coordinator, CoordinatorHandle, ProgressionEngine, SqliteStore, SystemClock};

/// Config file to use: `--config` if given, otherwise `~/.stepquest/config.toml`
pub fn resolve_config_path(config_override: Option<&PathBuf>) -> PathBuf {
    match config_override {
        Some(p) => p.clone(),
        None => Config::global_config_path(),
    }
}

/// A running coordinator over the on-disk store
///
/// Every command opens one, talks to it through the handle, and closes it
/// so pending writes are flushed before the process exits.
pub struct Session {
    pub handle: CoordinatorHandle,
    task: JoinHandle<()>,
}

impl Session {
    /// Must be called inside the tokio runtime
    pub fn open(config_override: Option<&PathBuf>, premium: bool) -> Result<Self> {
        let config_path = resolve_config_path(config_override);
        let config = Config::load_or_init(&config_path)?;

        let db_path = config.database_path();
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open progress database: {}", db_path.display()))?;
        debug!(path = %db_path.display(), "Opened progress database");

        let engine = ProgressionEngine::load(&store, Arc::new(SystemClock), config.engine.clone());
        let (handle, task) = Coordinator::spawn(
            engine,
            Arc::new(store),
            Arc::new(StaticEntitlement::new(premium)),
            Arc::new(AutoConfirm::default()),
            &config,
        );

        Ok(Self { handle, task })
    }

    /// Flush and stop the coordinator
    pub async fn close(self) -> Result<()> {
        self.handle.shutdown().await?;
        self.task.await.context("Coordinator task panicked")?;
        Ok(())
    }
}

/// Parse a full UUID argument
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("Invalid id: {raw}"))
}

/// Short display form of an id
pub fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

/// Render a 0.0 - 1.0 ratio as a fixed-width bar
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_clamps() {
        assert_eq!(progress_bar(0.0, 4), "[----]");
        assert_eq!(progress_bar(0.5, 4), "[##--]");
        assert_eq!(progress_bar(2.0, 4), "[####]");
    }

    #[test]
    fn test_short_id() {
        let id = Uuid::nil();
        assert_eq!(short_id(&id), "00000000");
    }
}
