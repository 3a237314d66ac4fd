//! Premium sync command

use std::path::PathBuf;

use anyhow::Result;

use super::Session;

/// Apply the `--premium` flag as the current subscription status
///
/// Turning premium on pays out achievements earned while it was off;
/// turning it off takes premium pets and accessories out of use.
pub async fn premium_sync_command(config_override: Option<&PathBuf>, premium: bool) -> Result<()> {
    let session = Session::open(config_override, premium)?;
    let result = session.handle.refresh_entitlements().await;
    let snapshot = session.handle.snapshot();
    session.close().await?;

    match result? {
        Some(delta) if !delta.events.is_empty() => {
            for event in &delta.events {
                println!("  {event}");
            }
        }
        _ => println!("Nothing changed."),
    }
    println!("Premium: {}", if snapshot.premium() { "active" } else { "inactive" });
    Ok(())
}
