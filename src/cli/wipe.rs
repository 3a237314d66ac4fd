//! Wipe command: erase all progression data

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;

use super::Session;

pub async fn wipe_command(config_override: Option<&PathBuf>, yes: bool) -> Result<()> {
    if !yes {
        print!("This erases all XP, achievements, streaks, quests, challenges and pets. Continue? [y/N] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let session = Session::open(config_override, false)?;
    let result = session.handle.wipe().await;
    session.close().await?;

    result?;
    println!("All progression data erased.");
    Ok(())
}
