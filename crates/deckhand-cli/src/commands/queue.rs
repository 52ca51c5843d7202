use anyhow::{Context, Result};
use colored::Colorize;
use deckhand_sync::{PendingUpload, UploadId};
use std::path::Path;
use tracing::info;

use super::open_store;
use crate::QueueCommands;

pub async fn execute(config: Option<&Path>, command: QueueCommands) -> Result<()> {
    let store = open_store(config).await?;

    match command {
        QueueCommands::List => {
            let uploads = store.pending_uploads();
            if uploads.is_empty() {
                println!("{}", "Queue is empty".green());
                return Ok(());
            }

            println!("{}", format!("{} pending upload(s)", uploads.len()).bold());
            println!();
            for upload in &uploads {
                println!("{}", describe(upload, store.max_retries()));
            }
        }
        QueueCommands::Reset { id } => {
            let id: UploadId = id
                .parse()
                .with_context(|| format!("Invalid upload id '{}'", id))?;

            let upload = store.reset_retry(id).await?;
            store.flush().await?;
            info!(upload_id = %id, "Reset from CLI");

            println!("  {} Reset {} ({})", "✓".green(), upload.id, upload.kind);
            println!("It will be sent with the next drain pass.");
        }
        QueueCommands::Clear { yes } => {
            let pending = store.pending_count();
            if pending == 0 {
                println!("{}", "Queue is already empty".green());
                return Ok(());
            }

            if !yes {
                println!(
                    "{} This discards {} upload(s) that never reached the server.",
                    "⚠".yellow(),
                    pending
                );
                println!("Re-run with --yes to confirm.");
                return Ok(());
            }

            let discarded = store.clear().await;
            store.flush().await?;
            println!("  {} Discarded {} upload(s)", "✓".green(), discarded);
        }
    }

    Ok(())
}

/// One line per upload: id, kind, attempts, last error
fn describe(upload: &PendingUpload, max_retries: u32) -> String {
    let attempts = format!("{}/{}", upload.retry_count, max_retries);
    let attempts = if upload.is_exhausted(max_retries) {
        attempts.red().to_string()
    } else if upload.retry_count > 0 {
        attempts.yellow().to_string()
    } else {
        attempts
    };

    let mut line = format!(
        "  {}  {:<16} {}  queued {}",
        upload.id,
        upload.kind.as_str(),
        attempts,
        upload.created_at.format("%Y-%m-%d %H:%M")
    );

    if let Some(error) = &upload.last_error {
        line.push_str(&format!("\n      last error: {}", error.dimmed()));
    }
    line
}
