use serde::{Deserialize, Serialize};

use crate::model::entry::BucketEntry;

/// Evidence that a bucket entry's track is now commercially released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseMatch {
    /// The bucket entry the catalog hit corresponds to.
    pub entry: BucketEntry,

    /// Canonical public URL of the catalog track.
    pub catalog_url: String,

    /// Title similarity that triggered the match.
    pub title_score: f64,

    /// Artist similarity that triggered the match.
    pub artist_score: f64,
}
