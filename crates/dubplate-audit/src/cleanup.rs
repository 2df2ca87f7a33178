//! Two-system removal of flagged entries.
//!
//! Every removal touches two systems: the fingerprint bucket (the
//! expensive, authoritative one) and the local metadata database. The
//! executor always deletes upstream first and only then completes the
//! local side, so a crash in between can never leave a track that looks
//! removed locally while its fingerprint still accrues charges.
//!
//! The window between the two writes is covered by a ledger: a pending
//! marker is written before the upstream delete and confirmed after the
//! local update. Markers left pending are surfaced by [`CleanupExecutor::reconcile`],
//! which consults the bucket to decide whether the delete ever landed.

use std::collections::HashSet;

use chrono::Utc;

use dubplate_core::model::{BucketEntry, DuplicateGroup, ReleaseMatch, RemovalId, RemovalRecord};
use dubplate_core::schema::Database;

use crate::bucket::BucketStore;
use crate::catalog::CATALOG_NAME;
use crate::error::AuditResult;

/// Removal reason recorded for duplicate entries.
pub const DUPLICATE_REASON: &str = "duplicate";

/// Explicit per-entry result of a removal attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Upstream delete and local update both landed.
    Removed,
    /// The upstream delete failed; nothing was changed anywhere.
    DeleteFailed(String),
    /// The upstream delete landed but the local update did not. The
    /// pending marker stays behind for `reconcile`.
    DbUpdateFailed(String),
}

impl CleanupOutcome {
    /// Whether the entry is actually gone from the bucket.
    #[must_use]
    pub const fn deleted_upstream(&self) -> bool {
        matches!(self, Self::Removed | Self::DbUpdateFailed(_))
    }
}

/// Record of one removal attempt, for reporting.
#[derive(Debug, Clone)]
pub struct CleanupAction {
    /// Bucket-side identifier of the entry.
    pub bucket_id: String,
    /// Human-readable "Artist - Title" label.
    pub label: String,
    /// Why the entry was removed.
    pub reason: String,
    /// What happened.
    pub outcome: CleanupOutcome,
}

/// Resolution of one stale pending marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The entry is gone from the bucket, so the delete did land.
    /// The local side has now been completed and the marker confirmed.
    Completed,
    /// The entry is still in the bucket, so the delete never landed.
    /// The stale marker has been dropped.
    Discarded,
    /// Completing the local side failed again; the marker stays.
    StillPending(String),
}

/// One reconciled ledger entry.
#[derive(Debug, Clone)]
pub struct ReconcileAction {
    /// The stale marker as found in the ledger.
    pub removal: RemovalRecord,
    /// How it was resolved.
    pub outcome: ReconcileOutcome,
}

/// Executes removals against a bucket store and the metadata database.
#[derive(Debug)]
pub struct CleanupExecutor<'a, S: BucketStore> {
    store: &'a S,
    db: &'a Database,
}

impl<'a, S: BucketStore> CleanupExecutor<'a, S> {
    pub const fn new(store: &'a S, db: &'a Database) -> Self {
        Self { store, db }
    }

    /// Remove every flagged entry: duplicates first, then released tracks.
    ///
    /// Per-entry failures are captured in the returned actions and never
    /// abort the pass. An entry flagged by both stages is only attempted
    /// once.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger itself cannot be written; without
    /// it no removal is safe to attempt.
    pub async fn cleanup(
        &self,
        groups: &[DuplicateGroup],
        matches: &[ReleaseMatch],
    ) -> AuditResult<Vec<CleanupAction>> {
        let mut actions = Vec::new();
        let mut attempted: HashSet<String> = HashSet::new();

        for group in groups {
            for entry in &group.duplicates {
                if !attempted.insert(entry.id.clone()) {
                    continue;
                }
                actions.push(self.remove_entry(entry, DUPLICATE_REASON).await?);
            }
        }

        for found in matches {
            if !attempted.insert(found.entry.id.clone()) {
                log::debug!(
                    "Skipping {}: already removed as a duplicate this pass",
                    found.entry.label()
                );
                continue;
            }
            let reason = format!("released on {CATALOG_NAME}: {}", found.catalog_url);
            actions.push(self.remove_entry(&found.entry, &reason).await?);
        }

        Ok(actions)
    }

    /// Remove a single entry: marker, upstream delete, local update.
    async fn remove_entry(&self, entry: &BucketEntry, reason: &str) -> AuditResult<CleanupAction> {
        let marker = self
            .db
            .begin_removal(&entry.id, entry.metadata.track_id.as_ref(), reason)?;

        let outcome = match self.store.delete_entry(&entry.id).await {
            Ok(()) => self.complete_local(entry, reason, &marker),
            Err(e) => {
                // Nothing changed upstream, so the marker is meaningless.
                if let Err(db_err) = self.db.abort_removal(&marker) {
                    log::warn!("Failed to drop removal marker {marker}: {db_err}");
                }
                log::warn!("Failed to delete {} from bucket: {e}", entry.label());
                CleanupOutcome::DeleteFailed(e.to_string())
            }
        };

        if let CleanupOutcome::DbUpdateFailed(msg) = &outcome {
            log::warn!(
                "Deleted {} upstream but the database update failed ({msg}); \
                 marker {marker} left pending",
                entry.label()
            );
        }

        Ok(CleanupAction {
            bucket_id: entry.id.clone(),
            label: entry.label(),
            reason: reason.to_string(),
            outcome,
        })
    }

    /// Finish the local half after a successful upstream delete.
    fn complete_local(
        &self,
        entry: &BucketEntry,
        reason: &str,
        marker: &RemovalId,
    ) -> CleanupOutcome {
        if let Some(track_id) = entry.metadata.track_id.as_ref() {
            if let Err(e) = self.db.mark_track_removed(track_id, reason, Utc::now()) {
                return CleanupOutcome::DbUpdateFailed(e.to_string());
            }
        }

        match self.db.confirm_removal(marker) {
            Ok(()) => {
                log::info!("Removed {} ({reason})", entry.label());
                CleanupOutcome::Removed
            }
            Err(e) => CleanupOutcome::DbUpdateFailed(e.to_string()),
        }
    }

    /// Resolve markers stuck in the pending state.
    ///
    /// The bucket is the ground truth: a marker whose entry is gone
    /// upstream gets its local side completed; a marker whose entry is
    /// still present is dropped as stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or the bucket
    /// cannot be listed.
    pub async fn reconcile(&self) -> AuditResult<Vec<ReconcileAction>> {
        let pending = self.db.list_pending_removals()?;
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let present: HashSet<String> = self
            .store
            .list_entries()
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        let mut actions = Vec::with_capacity(pending.len());
        for removal in pending {
            let outcome = if present.contains(&removal.bucket_id) {
                match self.db.abort_removal(&removal.id) {
                    Ok(()) => {
                        log::info!(
                            "Entry {} still in bucket; dropped stale marker {}",
                            removal.bucket_id,
                            removal.id
                        );
                        ReconcileOutcome::Discarded
                    }
                    Err(e) => ReconcileOutcome::StillPending(e.to_string()),
                }
            } else {
                self.complete_pending(&removal)
            };
            actions.push(ReconcileAction { removal, outcome });
        }

        Ok(actions)
    }

    /// Complete the local side of a marker whose delete did land.
    fn complete_pending(&self, removal: &RemovalRecord) -> ReconcileOutcome {
        if let Some(track_id) = removal.track_id.as_ref() {
            if let Err(e) = self.db.mark_track_removed(track_id, &removal.reason, Utc::now()) {
                return ReconcileOutcome::StillPending(e.to_string());
            }
        }

        match self.db.confirm_removal(&removal.id) {
            Ok(()) => {
                log::info!(
                    "Entry {} confirmed gone from bucket; completed removal {}",
                    removal.bucket_id,
                    removal.id
                );
                ReconcileOutcome::Completed
            }
            Err(e) => ReconcileOutcome::StillPending(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use async_trait::async_trait;
    use dubplate_core::model::{EntryMetadata, TrackId, TrackRecord, TrackStatus};
    use std::sync::Mutex;

    struct StubStore {
        entries: Vec<BucketEntry>,
        fail_ids: HashSet<String>,
        deleted: Mutex<Vec<String>>,
    }

    impl StubStore {
        fn new(entries: Vec<BucketEntry>) -> Self {
            Self {
                entries,
                fail_ids: HashSet::new(),
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, id: &str) -> Self {
            self.fail_ids.insert(id.to_string());
            self
        }

        fn deleted_ids(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BucketStore for StubStore {
        async fn list_entries(&self) -> AuditResult<Vec<BucketEntry>> {
            Ok(self.entries.clone())
        }

        async fn delete_entry(&self, id: &str) -> AuditResult<()> {
            if self.fail_ids.contains(id) {
                return Err(AuditError::Http {
                    service: "bucket".to_string(),
                    message: format!("delete of {id} refused"),
                });
            }
            self.deleted.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }

    fn entry(id: &str, title: &str, track_id: Option<TrackId>) -> BucketEntry {
        BucketEntry {
            id: id.to_string(),
            title: title.to_string(),
            artist: Some("Robin S".to_string()),
            duration_secs: Some(300),
            created_at: None,
            metadata: EntryMetadata {
                source_url: None,
                platform: None,
                track_id,
            },
        }
    }

    fn linked_track(db: &Database, bucket_id: &str, title: &str) -> TrackId {
        let track = TrackRecord::new_unreleased(title, Some(bucket_id.to_string()));
        db.insert_track(&track).unwrap();
        track.id
    }

    fn group_of(canonical: BucketEntry, duplicates: Vec<BucketEntry>) -> DuplicateGroup {
        DuplicateGroup {
            canonical,
            duplicates,
            reason: "exact artist/title key match".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cleanup_deletes_duplicates_and_updates_db() {
        let db = Database::open_in_memory().unwrap();
        let track_id = linked_track(&db, "2", "Show Me Love");

        let canonical = entry("1", "Show Me Love", None);
        let dup = entry("2", "Show Me Love", Some(track_id));
        let store = StubStore::new(vec![]);

        let executor = CleanupExecutor::new(&store, &db);
        let actions = executor
            .cleanup(&[group_of(canonical, vec![dup])], &[])
            .await
            .unwrap();

        assert_eq!(store.deleted_ids(), vec!["2"]);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].outcome, CleanupOutcome::Removed);
        assert_eq!(actions[0].reason, "duplicate");

        let track = db.get_track_by_id(&track_id).unwrap().unwrap();
        assert!(!track.active);
        assert_eq!(track.status, TrackStatus::Removed);
        assert_eq!(track.removal.unwrap().reason, "duplicate");

        assert!(db.list_pending_removals().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_canonical_entry_is_never_deleted() {
        let db = Database::open_in_memory().unwrap();
        let canonical = entry("1", "Show Me Love", None);
        let dup = entry("2", "Show Me Love", None);
        let store = StubStore::new(vec![]);

        let executor = CleanupExecutor::new(&store, &db);
        executor
            .cleanup(&[group_of(canonical, vec![dup])], &[])
            .await
            .unwrap();

        assert!(!store.deleted_ids().contains(&"1".to_string()));
    }

    #[tokio::test]
    async fn test_delete_failure_changes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let track_id = linked_track(&db, "2", "Show Me Love");

        let canonical = entry("1", "Show Me Love", None);
        let dup = entry("2", "Show Me Love", Some(track_id));
        let store = StubStore::new(vec![]).failing_on("2");

        let executor = CleanupExecutor::new(&store, &db);
        let actions = executor
            .cleanup(&[group_of(canonical, vec![dup])], &[])
            .await
            .unwrap();

        assert!(matches!(actions[0].outcome, CleanupOutcome::DeleteFailed(_)));
        assert!(store.deleted_ids().is_empty());

        // Track untouched, ledger empty: the failed attempt left no trace.
        let track = db.get_track_by_id(&track_id).unwrap().unwrap();
        assert!(track.active);
        assert_eq!(track.status, TrackStatus::Unreleased);
        assert!(db.list_pending_removals().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_db_failure_after_delete_leaves_pending_marker() {
        let db = Database::open_in_memory().unwrap();

        // Linked track id that has no row behind it, so the update fails
        // only after the upstream delete has already landed.
        let orphaned = TrackId::new();
        let canonical = entry("1", "Show Me Love", None);
        let dup = entry("2", "Show Me Love", Some(orphaned));
        let store = StubStore::new(vec![]);

        let executor = CleanupExecutor::new(&store, &db);
        let actions = executor
            .cleanup(&[group_of(canonical, vec![dup])], &[])
            .await
            .unwrap();

        assert!(matches!(
            actions[0].outcome,
            CleanupOutcome::DbUpdateFailed(_)
        ));
        assert!(actions[0].outcome.deleted_upstream());
        assert_eq!(store.deleted_ids(), vec!["2"]);

        let pending = db.list_pending_removals().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].bucket_id, "2");
    }

    #[tokio::test]
    async fn test_release_match_reason_includes_catalog_url() {
        let db = Database::open_in_memory().unwrap();
        let track_id = linked_track(&db, "3", "Show Me Love");
        let store = StubStore::new(vec![]);

        let found = ReleaseMatch {
            entry: entry("3", "Show Me Love", Some(track_id)),
            catalog_url: "https://open.spotify.com/track/2rdv".to_string(),
            title_score: 1.0,
            artist_score: 1.0,
        };

        let executor = CleanupExecutor::new(&store, &db);
        let actions = executor.cleanup(&[], &[found]).await.unwrap();

        assert_eq!(
            actions[0].reason,
            "released on spotify: https://open.spotify.com/track/2rdv"
        );
        let track = db.get_track_by_id(&track_id).unwrap().unwrap();
        assert_eq!(
            track.removal.unwrap().reason,
            "released on spotify: https://open.spotify.com/track/2rdv"
        );
    }

    #[tokio::test]
    async fn test_entry_flagged_twice_removed_once() {
        let db = Database::open_in_memory().unwrap();
        let canonical = entry("1", "Show Me Love", None);
        let dup = entry("2", "Show Me Love", None);
        let store = StubStore::new(vec![]);

        let found = ReleaseMatch {
            entry: entry("2", "Show Me Love", None),
            catalog_url: "https://c/2".to_string(),
            title_score: 1.0,
            artist_score: 1.0,
        };

        let executor = CleanupExecutor::new(&store, &db);
        let actions = executor
            .cleanup(&[group_of(canonical, vec![dup])], &[found])
            .await
            .unwrap();

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].reason, "duplicate");
        assert_eq!(store.deleted_ids(), vec!["2"]);
    }

    #[tokio::test]
    async fn test_reconcile_completes_when_entry_gone_upstream() {
        let db = Database::open_in_memory().unwrap();
        let track_id = linked_track(&db, "9", "Lost One");
        db.begin_removal("9", Some(&track_id), "duplicate").unwrap();

        // Bucket no longer lists entry 9: the delete landed.
        let store = StubStore::new(vec![entry("1", "Unrelated", None)]);

        let executor = CleanupExecutor::new(&store, &db);
        let actions = executor.reconcile().await.unwrap();

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].outcome, ReconcileOutcome::Completed);

        let track = db.get_track_by_id(&track_id).unwrap().unwrap();
        assert!(!track.active);
        assert!(db.list_pending_removals().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_discards_when_entry_still_present() {
        let db = Database::open_in_memory().unwrap();
        let track_id = linked_track(&db, "9", "Still Here");
        db.begin_removal("9", Some(&track_id), "duplicate").unwrap();

        // Bucket still lists entry 9: the delete never landed.
        let store = StubStore::new(vec![entry("9", "Still Here", None)]);

        let executor = CleanupExecutor::new(&store, &db);
        let actions = executor.reconcile().await.unwrap();

        assert_eq!(actions[0].outcome, ReconcileOutcome::Discarded);

        let track = db.get_track_by_id(&track_id).unwrap().unwrap();
        assert!(track.active);
        assert!(db.list_pending_removals().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_with_empty_ledger_skips_bucket_listing() {
        let db = Database::open_in_memory().unwrap();
        // A store that would fail if listed; reconcile must not touch it.
        struct ExplodingStore;

        #[async_trait]
        impl BucketStore for ExplodingStore {
            async fn list_entries(&self) -> AuditResult<Vec<BucketEntry>> {
                Err(AuditError::Http {
                    service: "bucket".to_string(),
                    message: "should not be called".to_string(),
                })
            }

            async fn delete_entry(&self, _id: &str) -> AuditResult<()> {
                Ok(())
            }
        }

        let store = ExplodingStore;
        let executor = CleanupExecutor::new(&store, &db);
        let actions = executor.reconcile().await.unwrap();
        assert!(actions.is_empty());
    }
}
