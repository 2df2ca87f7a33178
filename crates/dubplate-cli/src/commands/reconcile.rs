use anyhow::Result;
use std::path::PathBuf;

use dubplate_audit::bucket::BucketClient;
use dubplate_audit::cleanup::{CleanupExecutor, ReconcileOutcome};
use dubplate_core::schema::Database;

pub async fn run_reconcile(db: Option<PathBuf>, apply: bool) -> Result<()> {
    let config = super::load_config(db)?;
    let database = Database::open(&config.database_path)?;

    let pending = database.list_pending_removals()?;

    println!("\n🔧 Dubplate Reconcile\n");

    if pending.is_empty() {
        println!("  No pending removals");
        return Ok(());
    }

    println!("  Pending removals: {}\n", pending.len());
    for removal in &pending {
        println!(
            "    {} ({}, started {})",
            removal.bucket_id,
            removal.reason,
            removal.created_at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    if !apply {
        println!("\n  Re-run with --apply to resolve them against the bucket");
        return Ok(());
    }

    let (token, bucket_id) = super::bucket_credentials(&config)?;
    let store = BucketClient::new(token, bucket_id)?;
    let executor = CleanupExecutor::new(&store, &database);
    let actions = executor.reconcile().await?;

    println!();
    let mut resolved = 0;
    for action in &actions {
        match &action.outcome {
            ReconcileOutcome::Completed => {
                resolved += 1;
                println!(
                    "  ✓ {} completed (entry gone from the bucket)",
                    action.removal.bucket_id
                );
            }
            ReconcileOutcome::Discarded => {
                resolved += 1;
                println!(
                    "  ✓ {} discarded (entry still in the bucket)",
                    action.removal.bucket_id
                );
            }
            ReconcileOutcome::StillPending(e) => {
                println!("  ✗ {} still pending: {e}", action.removal.bucket_id);
            }
        }
    }

    println!("\n✓ Resolved {resolved} of {} pending removal(s)", actions.len());

    Ok(())
}
