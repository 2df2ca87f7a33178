//! Orchestration of a full validation run.
//!
//! A run is fetch, then the requested checks, then (only when asked)
//! cleanup. The default is a dry run: findings are reported, nothing is
//! removed. A listing failure aborts the run, since every stage works
//! off the same snapshot of the bucket.

use dubplate_core::model::ValidationReport;
use dubplate_core::schema::Database;

use crate::bucket::BucketStore;
use crate::catalog::{ReleaseChecker, ReleaseScan};
use crate::cleanup::{CleanupAction, CleanupExecutor};
use crate::dedup::DuplicateDetector;
use crate::error::AuditResult;

/// Which stages a validation run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Scan for duplicate entries.
    pub check_duplicates: bool,
    /// Check entries against the commercial catalog.
    pub check_released: bool,
    /// Remove flagged entries instead of only reporting them.
    pub cleanup: bool,
}

impl Default for RunOptions {
    /// Both checks on, cleanup off.
    fn default() -> Self {
        Self {
            check_duplicates: true,
            check_released: true,
            cleanup: false,
        }
    }
}

/// Everything one run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// The findings.
    pub report: ValidationReport,
    /// Per-entry removal results; `None` on a dry run.
    pub cleanup: Option<Vec<CleanupAction>>,
}

/// Wires the stages of a validation run together.
#[derive(Debug)]
pub struct Validator<S: BucketStore> {
    store: S,
    checker: Option<ReleaseChecker>,
    detector: DuplicateDetector,
    db: Database,
}

impl<S: BucketStore> Validator<S> {
    pub fn new(
        store: S,
        checker: Option<ReleaseChecker>,
        detector: DuplicateDetector,
        db: Database,
    ) -> Self {
        Self {
            store,
            checker,
            detector,
            db,
        }
    }

    /// Execute one validation run.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket cannot be listed, or if during
    /// cleanup the removal ledger cannot be written.
    pub async fn run(&self, options: &RunOptions) -> AuditResult<RunOutcome> {
        let stale = self.db.list_pending_removals()?;
        if !stale.is_empty() {
            log::warn!(
                "{} removal(s) from an earlier run never completed; run `dubplate reconcile`",
                stale.len()
            );
        }

        let entries = self.store.list_entries().await?;
        log::info!("Fetched {} entries from the bucket", entries.len());

        let duplicate_groups = if options.check_duplicates {
            let groups = self.detector.find_duplicates(&entries);
            log::info!("Found {} duplicate group(s)", groups.len());
            groups
        } else {
            Vec::new()
        };

        let scan = if options.check_released {
            match &self.checker {
                Some(checker) => checker.find_released(&entries).await,
                None => {
                    log::warn!("Catalog credentials not configured, skipping released check");
                    ReleaseScan::skipped("catalog credentials not configured")
                }
            }
        } else {
            ReleaseScan::default()
        };

        let report = ValidationReport {
            total_entries: entries.len(),
            duplicate_groups,
            release_matches: scan.matches,
            released_check_skipped: scan.skipped.is_some(),
            lookup_failures: scan.unavailable,
            stale_removals: stale.len(),
        };

        let cleanup = if options.cleanup {
            let executor = CleanupExecutor::new(&self.store, &self.db);
            Some(
                executor
                    .cleanup(&report.duplicate_groups, &report.release_matches)
                    .await?,
            )
        } else {
            None
        };

        Ok(RunOutcome { report, cleanup })
    }

    /// Resolve stale pending markers against the live bucket state.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or the bucket
    /// cannot be listed.
    pub async fn reconcile(&self) -> AuditResult<Vec<crate::cleanup::ReconcileAction>> {
        CleanupExecutor::new(&self.store, &self.db)
            .reconcile()
            .await
    }
}
