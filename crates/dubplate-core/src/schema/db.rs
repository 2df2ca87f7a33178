use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::{RemovalId, RemovalNote, RemovalRecord, RemovalState, TrackId, TrackRecord, TrackStatus};

use super::migrations::MIGRATIONS;

/// A database connection with CRUD methods for track records and the
/// removal ledger.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        // Create migrations table if it doesn't exist
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        // Get applied migrations
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        // Apply pending migrations
        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Track CRUD
impl Database {
    /// Insert a new track record.
    pub fn insert_track(&self, track: &TrackRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tracks (
                id, bucket_id, title, artist, duration_secs,
                status, active, removal, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                track.id.to_string(),
                track.bucket_id,
                track.title,
                track.artist,
                track.duration_secs.map(i64::from),
                track.status.as_str(),
                track.active,
                track
                    .removal
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                track.created_at.to_rfc3339(),
                track.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a track record by its id.
    pub fn get_track_by_id(&self, id: &TrackId) -> Result<Option<TrackRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, bucket_id, title, artist, duration_secs,
                    status, active, removal, created_at, updated_at
             FROM tracks WHERE id = ?1",
        )?;

        let mut rows = stmt.query_map([id.to_string()], row_to_track)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Get the track record linked to a bucket entry, if any.
    pub fn get_track_by_bucket_id(&self, bucket_id: &str) -> Result<Option<TrackRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, bucket_id, title, artist, duration_secs,
                    status, active, removal, created_at, updated_at
             FROM tracks WHERE bucket_id = ?1",
        )?;

        let mut rows = stmt.query_map([bucket_id], row_to_track)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List all active (not yet removed) track records.
    pub fn list_active_tracks(&self) -> Result<Vec<TrackRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, bucket_id, title, artist, duration_secs,
                    status, active, removal, created_at, updated_at
             FROM tracks
             WHERE active = 1
             ORDER BY created_at",
        )?;

        let tracks = stmt
            .query_map([], row_to_track)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tracks)
    }

    /// Count track records in the given status.
    pub fn count_tracks_by_status(&self, status: TrackStatus) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tracks WHERE status = ?1",
            [status.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Transition a track record to removed: set the status, clear the
    /// active flag, and attach the removal note.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no row matches the id, so callers
    /// can tell a landed update from a no-op.
    pub fn mark_track_removed(
        &self,
        id: &TrackId,
        reason: &str,
        removed_at: DateTime<Utc>,
    ) -> Result<()> {
        let note = RemovalNote {
            reason: reason.to_string(),
            removed_at,
        };
        let updated = self.conn.execute(
            "UPDATE tracks SET
                status = ?2, active = 0, removal = ?3, updated_at = ?4
             WHERE id = ?1",
            rusqlite::params![
                id.to_string(),
                TrackStatus::Removed.as_str(),
                serde_json::to_string(&note)?,
                removed_at.to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound {
                entity: "track",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

// Removal ledger
impl Database {
    /// Write a pending removal marker ahead of the upstream delete.
    pub fn begin_removal(
        &self,
        bucket_id: &str,
        track_id: Option<&TrackId>,
        reason: &str,
    ) -> Result<RemovalId> {
        let id = RemovalId::new();
        self.conn.execute(
            "INSERT INTO removals (id, bucket_id, track_id, reason, state, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                id.to_string(),
                bucket_id,
                track_id.map(ToString::to_string),
                reason,
                RemovalState::Pending.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    /// Flip a pending marker to confirmed once the track update has landed.
    pub fn confirm_removal(&self, id: &RemovalId) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE removals SET state = ?2, confirmed_at = ?3 WHERE id = ?1",
            rusqlite::params![
                id.to_string(),
                RemovalState::Confirmed.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound {
                entity: "removal",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Drop a pending marker after a failed upstream delete (nothing
    /// happened upstream, so there is nothing to reconcile).
    pub fn abort_removal(&self, id: &RemovalId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM removals WHERE id = ?1", [id.to_string()])?;

        if deleted == 0 {
            return Err(Error::NotFound {
                entity: "removal",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// List markers stuck in the pending state, oldest first.
    pub fn list_pending_removals(&self) -> Result<Vec<RemovalRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, bucket_id, track_id, reason, state, created_at, confirmed_at
             FROM removals
             WHERE state = 'pending'
             ORDER BY created_at",
        )?;

        let removals = stmt
            .query_map([], row_to_removal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(removals)
    }
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(Into::into)
        .map_err(|e| conversion_error(idx, e))
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn row_to_track(row: &rusqlite::Row) -> rusqlite::Result<TrackRecord> {
    let id_str: String = row.get(0)?;
    let id = TrackId::from_uuid(
        uuid::Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?,
    );
    let status_str: String = row.get(5)?;
    let removal_json: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(TrackRecord {
        id,
        bucket_id: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        duration_secs: row.get::<_, Option<i64>>(4)?.map(|v| v as u32),
        status: TrackStatus::from_str(&status_str).map_err(|e| conversion_error(5, e))?,
        active: row.get(6)?,
        removal: removal_json
            .map(|json| serde_json::from_str(&json).map_err(|e| conversion_error(7, e)))
            .transpose()?,
        created_at: parse_timestamp(8, &created_at_str)?,
        updated_at: parse_timestamp(9, &updated_at_str)?,
    })
}

fn row_to_removal(row: &rusqlite::Row) -> rusqlite::Result<RemovalRecord> {
    let id_str: String = row.get(0)?;
    let id = RemovalId::from_uuid(
        uuid::Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?,
    );
    let track_id_str: Option<String> = row.get(2)?;
    let track_id = track_id_str
        .map(|s| {
            uuid::Uuid::parse_str(&s)
                .map(TrackId::from_uuid)
                .map_err(|e| conversion_error(2, e))
        })
        .transpose()?;
    let state_str: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;
    let confirmed_at_str: Option<String> = row.get(6)?;

    Ok(RemovalRecord {
        id,
        bucket_id: row.get(1)?,
        track_id,
        reason: row.get(3)?,
        state: RemovalState::from_str(&state_str).map_err(|e| conversion_error(4, e))?,
        created_at: parse_timestamp(5, &created_at_str)?,
        confirmed_at: confirmed_at_str
            .map(|s| parse_timestamp(6, &s))
            .transpose()?,
    })
}
