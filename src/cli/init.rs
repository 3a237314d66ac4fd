//! Init command implementation

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use super::resolve_config_path;
use stepquest::{Config, SqliteStore};

/// Write a default config and create the progress database
pub async fn init_command(config_override: Option<&PathBuf>, force: bool) -> Result<()> {
    let config_path = resolve_config_path(config_override);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    config.save_to_file(&config_path)?;
    info!("Created config at {}", config_path.display());

    let db_path = config.database_path();
    SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to create progress database: {}", db_path.display()))?;

    println!("Config:   {}", config_path.display());
    println!("Database: {}", db_path.display());
    println!("Daily step goal: {}", config.engine.step_goal());

    Ok(())
}
