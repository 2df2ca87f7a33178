//! Integration tests for the full validation run.
//!
//! These tests drive the validator against an in-process bucket store stub,
//! so the whole list → detect → cleanup → re-run loop can be exercised
//! without a live fingerprint service or catalog credentials.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use dubplate_audit::bucket::BucketStore;
use dubplate_audit::cleanup::CleanupOutcome;
use dubplate_audit::config::MatchThresholds;
use dubplate_audit::dedup::DuplicateDetector;
use dubplate_audit::error::{AuditError, AuditResult};
use dubplate_audit::validate::{RunOptions, Validator};
use dubplate_core::model::{BucketEntry, EntryMetadata, TrackRecord, TrackStatus};
use dubplate_core::schema::Database;

/// Bucket store backed by a shared in-memory list. Clones share state, so
/// a test can keep one handle for assertions while the validator owns
/// another.
#[derive(Clone)]
struct ScriptedBucket {
    entries: Arc<Mutex<Vec<BucketEntry>>>,
}

impl ScriptedBucket {
    fn new(entries: Vec<BucketEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    fn remaining_ids(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }
}

#[async_trait]
impl BucketStore for ScriptedBucket {
    async fn list_entries(&self) -> AuditResult<Vec<BucketEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn delete_entry(&self, id: &str) -> AuditResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(AuditError::Http {
                service: "bucket".to_string(),
                message: format!("404 Not Found: {id}"),
            });
        }
        Ok(())
    }
}

fn entry(id: &str, artist: &str, title: &str, duration: u32) -> BucketEntry {
    BucketEntry {
        id: id.to_string(),
        title: title.to_string(),
        artist: Some(artist.to_string()),
        duration_secs: Some(duration),
        created_at: None,
        metadata: EntryMetadata::default(),
    }
}

fn detector() -> DuplicateDetector {
    DuplicateDetector::new(MatchThresholds::default())
}

/// A dry run reports findings without touching the bucket; a cleanup run
/// removes them; a run after that comes back clean.
#[tokio::test]
async fn test_dry_run_cleanup_rerun_loop() {
    let bucket = ScriptedBucket::new(vec![
        entry("1", "Robin S", "Show Me Love", 229),
        entry("2", "Robin S", "Show Me Love (Unreleased)", 240),
        entry("3", "M83", "Midnight City", 243),
    ]);

    // Dry run: one group, nothing removed.
    let db = Database::open_in_memory().expect("Failed to open database");
    let validator = Validator::new(bucket.clone(), None, detector(), db);
    let outcome = validator
        .run(&RunOptions::default())
        .await
        .expect("Dry run should succeed");

    assert_eq!(outcome.report.duplicate_groups.len(), 1);
    assert_eq!(outcome.report.removable_total(), 1);
    assert!(outcome.cleanup.is_none());
    assert_eq!(bucket.remaining_ids(), vec!["1", "2", "3"]);

    // Cleanup run: the non-canonical duplicate goes.
    let options = RunOptions {
        cleanup: true,
        ..RunOptions::default()
    };
    let outcome = validator
        .run(&options)
        .await
        .expect("Cleanup run should succeed");

    let actions = outcome.cleanup.expect("Cleanup results expected");
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].bucket_id, "2");
    assert_eq!(actions[0].outcome, CleanupOutcome::Removed);
    assert_eq!(bucket.remaining_ids(), vec!["1", "3"]);

    // Re-run: nothing left to flag.
    let outcome = validator
        .run(&RunOptions::default())
        .await
        .expect("Re-run should succeed");
    assert!(outcome.report.is_clean());
}

/// The first-seen entry is kept as canonical; later near-identical
/// listings from other sources are the ones removed.
#[tokio::test]
async fn test_cross_source_duplicates_keep_first_seen() {
    let mut soundcloud = entry("10", "Robin S", "Show Me Love", 229);
    soundcloud.metadata.platform = Some("soundcloud".to_string());
    let mut youtube = entry("11", "Robin S", "Show Me Love [Free Download]", 231);
    youtube.metadata.platform = Some("youtube".to_string());

    let bucket = ScriptedBucket::new(vec![soundcloud, youtube]);
    let db = Database::open_in_memory().expect("Failed to open database");
    let validator = Validator::new(bucket.clone(), None, detector(), db);

    let options = RunOptions {
        cleanup: true,
        ..RunOptions::default()
    };
    validator
        .run(&options)
        .await
        .expect("Cleanup run should succeed");

    assert_eq!(bucket.remaining_ids(), vec!["10"]);
}

/// Cleanup persists the removal to the metadata database on disk, not
/// just the in-memory handle.
#[tokio::test]
async fn test_cleanup_persists_to_database_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("dubplate.db");

    let db = Database::open(&db_path).expect("Failed to open database");
    let track = TrackRecord::new_unreleased("Show Me Love", Some("2".to_string()));
    db.insert_track(&track).expect("Failed to insert track");

    let mut dup = entry("2", "Robin S", "Show Me Love", 229);
    dup.metadata.track_id = Some(track.id);

    let bucket = ScriptedBucket::new(vec![entry("1", "Robin S", "Show Me Love", 229), dup]);
    let validator = Validator::new(bucket, None, detector(), db);

    let options = RunOptions {
        cleanup: true,
        ..RunOptions::default()
    };
    validator
        .run(&options)
        .await
        .expect("Cleanup run should succeed");
    drop(validator);

    // Reopen from the file and verify the update landed.
    let db = Database::open(&db_path).expect("Failed to reopen database");
    let stored = db
        .get_track_by_id(&track.id)
        .expect("Failed to query track")
        .expect("Track should still exist");
    assert_eq!(stored.status, TrackStatus::Removed);
    assert!(!stored.active);
    assert_eq!(stored.removal.expect("Removal note expected").reason, "duplicate");

    // Ledger fully confirmed, nothing pending.
    assert!(db.list_pending_removals().unwrap().is_empty());
}

/// Reconciliation completes a marker whose entry is gone from the bucket
/// and the next run no longer reports stale removals.
#[tokio::test]
async fn test_reconcile_clears_stale_markers() {
    let bucket = ScriptedBucket::new(vec![entry("1", "Robin S", "Show Me Love", 229)]);
    let db = Database::open_in_memory().expect("Failed to open database");

    // Marker for an entry that is no longer listed: that delete landed in
    // a previous run whose database update never did.
    db.begin_removal("gone-id", None, "duplicate")
        .expect("Failed to write marker");

    let validator = Validator::new(bucket, None, detector(), db);

    let outcome = validator
        .run(&RunOptions::default())
        .await
        .expect("Run should succeed");
    assert_eq!(outcome.report.stale_removals, 1);

    let actions = validator.reconcile().await.expect("Reconcile should succeed");
    assert_eq!(actions.len(), 1);

    let outcome = validator
        .run(&RunOptions::default())
        .await
        .expect("Run should succeed");
    assert_eq!(outcome.report.stale_removals, 0);
}
