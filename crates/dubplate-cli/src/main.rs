use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use dubplate_audit::validate::RunOptions;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "dubplate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Scan the bucket for duplicate entries
    ///
    /// Without --released this limits the run to the duplicate check.
    #[arg(long)]
    duplicates: bool,

    /// Check bucket entries against the commercial catalog
    ///
    /// Without --duplicates this limits the run to the released check.
    #[arg(long)]
    released: bool,

    /// Remove flagged entries from the bucket and the database
    ///
    /// Without this flag the run only reports what it would remove.
    #[arg(long)]
    cleanup: bool,

    /// Path to the database (default: ~/.local/share/dubplate/dubplate.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Show database and removal-ledger status
    Status,
    /// Resolve removals that never completed
    ///
    /// Every removal deletes the bucket entry first and updates the
    /// database second. If a run dies between the two, the removal is
    /// left pending. This command lists pending removals and, with
    /// --apply, resolves each one against the live bucket: entries that
    /// are gone get their database side completed, entries still present
    /// get their stale marker dropped.
    Reconcile {
        /// Apply resolutions instead of only listing pending removals
        #[arg(long)]
        apply: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Status) => {
            commands::show_status(cli.db)?;
        }
        Some(Commands::Reconcile { apply }) => {
            commands::run_reconcile(cli.db, apply).await?;
        }
        Some(Commands::Config { action }) => {
            commands::run_config(action)?;
        }
        None => {
            // A lone --cleanup (or no flags at all) runs both checks.
            let options = RunOptions {
                check_duplicates: cli.duplicates || !cli.released,
                check_released: cli.released || !cli.duplicates,
                cleanup: cli.cleanup,
            };
            commands::run_validate(cli.db, &options).await?;
        }
    }

    Ok(())
}
