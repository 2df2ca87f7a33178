use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::TrackId;

/// Provenance metadata attached to a bucket entry at ingestion time.
///
/// Everything here is owned by the upstream ingestion pipeline; the audit
/// only reads it (to link entries back to metadata-database records and to
/// make log lines traceable to a source).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Where the recording was originally found (page URL on the source
    /// platform).
    pub source_url: Option<String>,

    /// The ingestion source platform (e.g. "soundcloud", "youtube").
    pub platform: Option<String>,

    /// Foreign key to the metadata-database track record, when one exists.
    pub track_id: Option<TrackId>,
}

/// One fingerprint record in the remote bucket.
///
/// Read-only to the audit except for deletion during cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketEntry {
    /// Fingerprint-service identifier, used for deletion.
    pub id: String,

    /// Track title as stored in the bucket.
    pub title: String,

    /// Associated artist name, when the source provided one.
    pub artist: Option<String>,

    /// Duration in seconds, when the source provided one.
    pub duration_secs: Option<u32>,

    /// When the entry was created in the bucket.
    pub created_at: Option<DateTime<Utc>>,

    /// Ingestion provenance.
    pub metadata: EntryMetadata,
}

impl BucketEntry {
    /// Human-readable label for logs and summaries: `"artist - title"`, or
    /// just the title when no artist is known.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{} - {}", artist, self.title),
            None => self.title.clone(),
        }
    }

    /// Whether the entry carries enough metadata for the fuzzy duplicate
    /// rule (artist and duration both present).
    #[must_use]
    pub const fn has_full_metadata(&self) -> bool {
        self.artist.is_some() && self.duration_secs.is_some()
    }
}
