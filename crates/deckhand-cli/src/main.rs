mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(version, about = "Deckhand CLI - offline upload queue and APA reconciliation", long_about = None)]
struct Cli {
    /// Path to deckhand.toml (defaults to ./deckhand.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the state of the persisted upload queue
    Status,

    /// Inspect or repair the upload queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },

    /// Reconcile counted cash against advances and expenses
    Reconcile {
        /// Total cash advanced
        #[arg(short, long)]
        advances: f64,

        /// Total spent
        #[arg(short, long)]
        expenses: f64,

        /// Cash counted on board
        #[arg(short, long)]
        cash: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a booking ledger (JSON file with advances and expenses)
    Summary {
        /// Ledger file
        ledger: PathBuf,

        /// Also reconcile against this counted cash
        #[arg(short, long)]
        cash: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List queued uploads in processing order
    List,

    /// Give an upload a fresh retry budget
    Reset {
        /// Upload id
        id: String,
    },

    /// Discard every queued upload
    Clear {
        /// Skip the confirmation guard
        #[arg(short, long)]
        yes: bool,
    },
}

/// Log level used when RUST_LOG is unset
fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_tracing(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Execute command
    match cli.command {
        Commands::Status => {
            commands::status::execute(cli.config.as_deref()).await?;
        }
        Commands::Queue { command } => {
            commands::queue::execute(cli.config.as_deref(), command).await?;
        }
        Commands::Reconcile {
            advances,
            expenses,
            cash,
            json,
        } => {
            commands::reconcile::execute(advances, expenses, cash, json)?;
        }
        Commands::Summary { ledger, cash, json } => {
            commands::summary::execute(&ledger, cash, json)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reconcile() {
        let cli = Cli::try_parse_from([
            "deckhand", "reconcile", "--advances", "1000", "--expenses", "400", "--cash", "650",
        ])
        .unwrap();

        match cli.command {
            Commands::Reconcile { advances, expenses, cash, json } => {
                assert_eq!((advances, expenses, cash), (1000.0, 400.0, 650.0));
                assert!(!json);
            }
            _ => panic!("expected reconcile"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["deckhand", "queue", "list", "--config", "boat.toml", "-v"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("boat.toml")));
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Queue { command: QueueCommands::List }
        ));
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_level(false), "info");
        assert_eq!(default_level(true), "debug");
    }

    #[test]
    fn test_queue_reset_requires_id() {
        assert!(Cli::try_parse_from(["deckhand", "queue", "reset"]).is_err());
    }
}
