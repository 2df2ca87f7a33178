use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::ids::{RemovalId, TrackId};

/// Lifecycle status of a metadata-database track record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    /// Tracked as not yet commercially released.
    Unreleased,
    /// Removed by a cleanup pass (duplicate or released).
    Removed,
}

impl TrackStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unreleased => "unreleased",
            Self::Removed => "removed",
        }
    }
}

impl std::str::FromStr for TrackStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unreleased" => Ok(Self::Unreleased),
            "removed" => Ok(Self::Removed),
            other => Err(Error::InvalidData(format!("unknown track status: {other}"))),
        }
    }
}

/// Why and when a track record was removed.
///
/// Stored as a JSON column on the track row so the reason survives
/// alongside the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalNote {
    /// `"duplicate"` or `"released on <catalog>: <url>"`.
    pub reason: String,

    /// When the removal was applied.
    pub removed_at: DateTime<Utc>,
}

/// One track row in the metadata database.
///
/// The audit performs exactly one kind of write against these: the
/// transition to [`TrackStatus::Removed`] with a [`RemovalNote`], and only
/// after the upstream bucket deletion is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: TrackId,

    /// Identifier of the linked bucket entry, when one exists.
    pub bucket_id: Option<String>,

    pub title: String,

    pub artist: Option<String>,

    pub duration_secs: Option<u32>,

    pub status: TrackStatus,

    /// Cleared together with the status transition to removed.
    pub active: bool,

    /// Present iff the record has been removed.
    pub removal: Option<RemovalNote>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl TrackRecord {
    /// A fresh unreleased record linked to a bucket entry.
    #[must_use]
    pub fn new_unreleased(title: impl Into<String>, bucket_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TrackId::new(),
            bucket_id,
            title: title.into(),
            artist: None,
            duration_secs: None,
            status: TrackStatus::Unreleased,
            active: true,
            removal: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Phase of a row in the removal ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalState {
    /// Marker written before the upstream delete; a row stuck here means
    /// the delete may have happened without the database catching up.
    Pending,
    /// Upstream delete succeeded and the database update landed.
    Confirmed,
}

impl RemovalState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }
}

impl std::str::FromStr for RemovalState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(Error::InvalidData(format!("unknown removal state: {other}"))),
        }
    }
}

/// One row of the two-phase removal ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalRecord {
    pub id: RemovalId,

    /// The bucket entry being removed.
    pub bucket_id: String,

    /// The linked track record, when the entry carried one.
    pub track_id: Option<TrackId>,

    /// Reason carried into the track's removal note on confirmation.
    pub reason: String,

    pub state: RemovalState,

    pub created_at: DateTime<Utc>,

    /// Set when the row flips to confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_track_status_round_trips_as_str() {
        for status in [TrackStatus::Unreleased, TrackStatus::Removed] {
            assert_eq!(TrackStatus::from_str(status.as_str()).ok(), Some(status));
        }
    }

    #[test]
    fn test_track_status_rejects_unknown() {
        assert!(TrackStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_removal_state_round_trips_as_str() {
        for state in [RemovalState::Pending, RemovalState::Confirmed] {
            assert_eq!(RemovalState::from_str(state.as_str()).ok(), Some(state));
        }
    }

    #[test]
    fn test_new_unreleased_is_active() {
        let track = TrackRecord::new_unreleased("Show Me Love", Some("42".to_string()));
        assert_eq!(track.status, TrackStatus::Unreleased);
        assert!(track.active);
        assert!(track.removal.is_none());
        assert_eq!(track.bucket_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_removal_note_serializes_to_json() {
        let note = RemovalNote {
            reason: "duplicate".to_string(),
            removed_at: Utc::now(),
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"reason\":\"duplicate\""));
        let back: RemovalNote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, note);
    }
}
