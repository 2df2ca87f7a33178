/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Metadata-database track records
CREATE TABLE IF NOT EXISTS tracks (
    id TEXT PRIMARY KEY,
    bucket_id TEXT UNIQUE,
    title TEXT NOT NULL,
    artist TEXT,
    duration_secs INTEGER,
    status TEXT NOT NULL DEFAULT 'unreleased',
    active INTEGER NOT NULL DEFAULT 1,
    removal TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tracks_bucket_id ON tracks(bucket_id);
CREATE INDEX IF NOT EXISTS idx_tracks_status ON tracks(status);

-- Two-phase removal ledger: a row is written as 'pending' before the
-- upstream bucket delete and flipped to 'confirmed' only after the track
-- update lands. Rows stuck at 'pending' are the reconciliation input.
CREATE TABLE IF NOT EXISTS removals (
    id TEXT PRIMARY KEY,
    bucket_id TEXT NOT NULL,
    track_id TEXT REFERENCES tracks(id),
    reason TEXT NOT NULL,
    state TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    confirmed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_removals_state ON removals(state);
CREATE INDEX IF NOT EXISTS idx_removals_bucket_id ON removals(bucket_id);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
