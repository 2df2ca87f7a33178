use serde::{Deserialize, Serialize};

use crate::model::group::DuplicateGroup;
use crate::model::release::ReleaseMatch;

/// Findings of one validation run.
///
/// Produced once per run and never persisted; it only drives the summary
/// output and, when cleanup is requested, the executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Total bucket entries examined.
    pub total_entries: usize,

    /// Duplicate groups found (empty when the stage was not requested).
    pub duplicate_groups: Vec<DuplicateGroup>,

    /// Release matches found (empty when the stage was not requested or
    /// was skipped).
    pub release_matches: Vec<ReleaseMatch>,

    /// The released check was requested but skipped (missing credentials
    /// or a failed token exchange).
    pub released_check_skipped: bool,

    /// Catalog lookups that failed and were treated as "not found".
    pub lookup_failures: usize,

    /// Pending removal markers left behind by earlier runs, found at the
    /// start of this one.
    pub stale_removals: usize,
}

impl ValidationReport {
    /// Total entries sitting in groups as duplicates (excluding canonicals).
    #[must_use]
    pub fn duplicate_entry_count(&self) -> usize {
        self.duplicate_groups
            .iter()
            .map(DuplicateGroup::removable_count)
            .sum()
    }

    /// How many entries a cleanup pass would remove.
    #[must_use]
    pub fn removable_total(&self) -> usize {
        self.duplicate_entry_count() + self.release_matches.len()
    }

    /// Whether the run found nothing to act on.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.duplicate_groups.is_empty() && self.release_matches.is_empty()
    }
}
