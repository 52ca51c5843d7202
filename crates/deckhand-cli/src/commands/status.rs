use anyhow::Result;
use colored::Colorize;
use deckhand_sync::SyncStatus;
use std::path::Path;

use super::open_store;

pub async fn execute(config: Option<&Path>) -> Result<()> {
    let store = open_store(config).await?;
    let snapshot = store.snapshot();

    let status = match snapshot.sync_status {
        SyncStatus::Synced => "synced".green(),
        SyncStatus::Pending => "pending".yellow(),
        SyncStatus::Syncing => "syncing".cyan(),
        SyncStatus::Error => "error".red(),
    };

    println!("{}", "Upload queue".bold());
    println!();
    println!("  Status:      {}", status.bold());
    println!("  Storage:     {}", store.storage_name());
    println!("  Pending:     {}", snapshot.pending_count);
    println!(
        "  Exhausted:   {} (after {} attempts)",
        snapshot.exhausted_count,
        store.max_retries()
    );

    if let Some(at) = snapshot.last_sync_at {
        println!("  Last sync:   {}", at.to_rfc3339());
    }

    if let Some(error) = &snapshot.sync_error {
        println!();
        println!("  {} {}", "⚠".yellow(), error);
    }

    if snapshot.exhausted_count > 0 {
        println!();
        println!("Run `deckhand queue list` and `deckhand queue reset <id>` to retry.");
    }

    Ok(())
}
