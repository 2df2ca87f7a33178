use anyhow::Result;
use std::path::PathBuf;

use dubplate_audit::bucket::BucketClient;
use dubplate_audit::catalog::ReleaseChecker;
use dubplate_audit::cleanup::{CleanupAction, CleanupOutcome};
use dubplate_audit::dedup::DuplicateDetector;
use dubplate_audit::validate::{RunOptions, Validator};
use dubplate_core::model::ValidationReport;
use dubplate_core::schema::Database;

pub async fn run_validate(db: Option<PathBuf>, options: &RunOptions) -> Result<()> {
    let config = super::load_config(db)?;
    let (token, bucket_id) = super::bucket_credentials(&config)?;

    tracing::info!("Starting validation of bucket {bucket_id}");

    let store = BucketClient::new(token, bucket_id)?;
    let checker = ReleaseChecker::from_credentials(
        config.catalog_client_id.clone(),
        config.catalog_client_secret.clone(),
        config.matching,
    )?;
    let detector = DuplicateDetector::new(config.matching);
    let database = Database::open(&config.database_path)?;

    let validator = Validator::new(store, checker, detector, database);
    let outcome = validator.run(options).await?;

    print_report(&outcome.report, options);

    match outcome.cleanup {
        Some(actions) => print_cleanup(&actions),
        None => {
            let removable = outcome.report.removable_total();
            if removable > 0 {
                println!(
                    "\n  {removable} item(s) should be removed; re-run with --cleanup to remove them"
                );
            } else {
                println!("\n✓ Bucket is clean");
            }
        }
    }

    Ok(())
}

fn print_report(report: &ValidationReport, options: &RunOptions) {
    println!("\n🔍 Dubplate Validation\n");
    println!("  Bucket entries: {}", report.total_entries);

    if report.stale_removals > 0 {
        println!(
            "  ⚠ {} removal(s) from an earlier run never completed; run `dubplate reconcile`",
            report.stale_removals
        );
    }

    if options.check_duplicates {
        println!(
            "\n  Duplicate groups: {} ({} removable)",
            report.duplicate_groups.len(),
            report.duplicate_entry_count()
        );
        for group in &report.duplicate_groups {
            println!("\n    Keeping: {}", group.canonical.label());
            for dup in &group.duplicates {
                println!("     Remove: {}", dup.label());
            }
            println!("     Reason: {}", group.reason);
        }
    }

    if options.check_released {
        if report.released_check_skipped {
            println!("\n  ⚠ Released check skipped (catalog not configured or unreachable)");
        } else {
            println!("\n  Released on catalog: {}", report.release_matches.len());
            for found in &report.release_matches {
                println!("    {} -> {}", found.entry.label(), found.catalog_url);
            }
            if report.lookup_failures > 0 {
                println!(
                    "    ({} lookup(s) failed and were counted as not released)",
                    report.lookup_failures
                );
            }
        }
    }
}

fn print_cleanup(actions: &[CleanupAction]) {
    println!("\n🧹 Cleanup\n");

    if actions.is_empty() {
        println!("  Nothing to remove");
        return;
    }

    let mut removed = 0;
    let mut needs_reconcile = false;
    for action in actions {
        match &action.outcome {
            CleanupOutcome::Removed => {
                removed += 1;
                println!("  ✓ {} ({})", action.label, action.reason);
            }
            CleanupOutcome::DeleteFailed(e) => {
                println!("  ✗ {} left in place: {e}", action.label);
            }
            CleanupOutcome::DbUpdateFailed(e) => {
                needs_reconcile = true;
                println!(
                    "  ✗ {} deleted from the bucket, but the database update failed: {e}",
                    action.label
                );
            }
        }
    }

    println!("\n✓ Removed {removed} of {} flagged item(s)", actions.len());
    if needs_reconcile {
        println!("  Run `dubplate reconcile` to finish the incomplete removals");
    }
}
