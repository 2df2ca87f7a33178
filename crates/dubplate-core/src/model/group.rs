use serde::{Deserialize, Serialize};

use crate::model::entry::BucketEntry;

/// A collapsed set of bucket entries judged to be the same recording.
///
/// One entry is kept (the canonical), the rest are slated for removal.
/// Any given entry belongs to at most one group, as canonical or as a
/// duplicate, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The representative entry retained when the group is collapsed.
    pub canonical: BucketEntry,

    /// The redundant entries, in the order they were scanned.
    pub duplicates: Vec<BucketEntry>,

    /// What triggered the grouping (key equality or the similarity scores).
    pub reason: String,
}

impl DuplicateGroup {
    /// Number of entries the group would remove (everything but the
    /// canonical).
    #[must_use]
    pub fn removable_count(&self) -> usize {
        self.duplicates.len()
    }

    /// All member entries, canonical first.
    pub fn members(&self) -> impl Iterator<Item = &BucketEntry> {
        std::iter::once(&self.canonical).chain(self.duplicates.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::EntryMetadata;

    fn entry(id: &str) -> BucketEntry {
        BucketEntry {
            id: id.to_string(),
            title: "Show Me Love".to_string(),
            artist: Some("Robin S".to_string()),
            duration_secs: Some(300),
            created_at: None,
            metadata: EntryMetadata::default(),
        }
    }

    #[test]
    fn test_removable_count_excludes_canonical() {
        let group = DuplicateGroup {
            canonical: entry("1"),
            duplicates: vec![entry("2"), entry("3")],
            reason: "exact artist/title key match".to_string(),
        };
        assert_eq!(group.removable_count(), 2);
    }

    #[test]
    fn test_members_yields_canonical_first() {
        let group = DuplicateGroup {
            canonical: entry("1"),
            duplicates: vec![entry("2")],
            reason: "exact artist/title key match".to_string(),
        };
        let ids: Vec<&str> = group.members().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
