//! Duplicate detection over the bucket listing.
//!
//! A pairwise O(n²) scan in listing order, acceptable for bucket sizes in
//! the low thousands. Group membership lives in an explicit disjoint-set
//! keyed by entry position, and an entry already attached to a group is
//! skipped both as a scan origin and as a candidate. That skip rule is
//! what guarantees single assignment: an entry consumed as someone's
//! duplicate can never open or join another group, and groups never merge
//! transitively (A~B and B~C with A≁C still yields only {A, B}).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use dubplate_core::model::{BucketEntry, DuplicateGroup};

use crate::config::MatchThresholds;
use crate::similarity::similarity;
use crate::text::entry_key;

/// Union-find over entry positions, restricted to attaching singletons.
#[derive(Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    /// The root owning `idx`, with path compression.
    pub fn find(&mut self, idx: usize) -> usize {
        let mut root = idx;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = idx;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Attach `child` (a singleton) under `root`, keeping `root` the owner.
    pub fn attach(&mut self, root: usize, child: usize) {
        self.parent[child] = root;
    }

    /// Whether `idx` still owns itself (not consumed by any group).
    pub fn is_root(&mut self, idx: usize) -> bool {
        self.find(idx) == idx
    }
}

/// Strategy for choosing which member of a duplicate set is kept.
pub trait CanonicalPolicy: std::fmt::Debug {
    /// Pick the index of the member to keep. Members arrive in scan order.
    fn choose(&self, members: &[&BucketEntry]) -> usize;
}

/// Keep the first entry the scan saw (lowest listing index).
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSeen;

impl CanonicalPolicy for FirstSeen {
    fn choose(&self, _members: &[&BucketEntry]) -> usize {
        0
    }
}

/// Keep the entry with the oldest creation timestamp; entries without one
/// lose to any dated entry, and ties fall back to scan order.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarliestCreated;

impl CanonicalPolicy for EarliestCreated {
    fn choose(&self, members: &[&BucketEntry]) -> usize {
        members
            .iter()
            .enumerate()
            .min_by_key(|(idx, entry)| {
                let created = entry.created_at.unwrap_or(DateTime::<Utc>::MAX_UTC);
                (created, *idx)
            })
            .map_or(0, |(idx, _)| idx)
    }
}

/// Scans the bucket listing for duplicate entries.
#[derive(Debug)]
pub struct DuplicateDetector {
    thresholds: MatchThresholds,
    policy: Box<dyn CanonicalPolicy>,
}

impl DuplicateDetector {
    /// Detector with the default first-seen canonical policy.
    #[must_use]
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self {
            thresholds,
            policy: Box::new(FirstSeen),
        }
    }

    /// Detector with a custom canonical-selection policy.
    #[must_use]
    pub fn with_policy(thresholds: MatchThresholds, policy: Box<dyn CanonicalPolicy>) -> Self {
        Self { thresholds, policy }
    }

    /// Group duplicate entries, preserving listing order.
    ///
    /// Every entry lands in at most one group, as canonical or duplicate.
    #[must_use]
    pub fn find_duplicates(&self, entries: &[BucketEntry]) -> Vec<DuplicateGroup> {
        let keys: Vec<String> = entries
            .iter()
            .map(|e| entry_key(e.artist.as_deref(), &e.title))
            .collect();

        let mut set = DisjointSet::new(entries.len());
        let mut reasons: HashMap<usize, String> = HashMap::new();

        for i in 0..entries.len() {
            if !set.is_root(i) {
                continue;
            }
            for j in (i + 1)..entries.len() {
                if !set.is_root(j) {
                    continue;
                }
                if let Some(reason) =
                    self.match_reason(&entries[i], &entries[j], &keys[i], &keys[j])
                {
                    set.attach(i, j);
                    reasons.entry(i).or_insert(reason);
                }
            }
        }

        // BTreeMap keeps roots in scan order; member lists fill in scan
        // order too, since idx ascends.
        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for idx in 0..entries.len() {
            let root = set.find(idx);
            components.entry(root).or_default().push(idx);
        }

        components
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(root, members)| {
                let refs: Vec<&BucketEntry> = members.iter().map(|&idx| &entries[idx]).collect();
                let keep = self.policy.choose(&refs).min(refs.len() - 1);
                let canonical = refs[keep].clone();
                let duplicates = refs
                    .iter()
                    .enumerate()
                    .filter(|&(pos, _)| pos != keep)
                    .map(|(_, entry)| (*entry).clone())
                    .collect();
                DuplicateGroup {
                    canonical,
                    duplicates,
                    reason: reasons.get(&root).cloned().unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Why two entries are the same recording, or `None`.
    ///
    /// The fuzzy rule needs artist and duration on both sides; entries
    /// missing either degrade to exact key equality.
    fn match_reason(
        &self,
        a: &BucketEntry,
        b: &BucketEntry,
        key_a: &str,
        key_b: &str,
    ) -> Option<String> {
        if a.has_full_metadata() && b.has_full_metadata() {
            let title_score = similarity(&a.title, &b.title);
            let artist_score = similarity(
                a.artist.as_deref().unwrap_or_default(),
                b.artist.as_deref().unwrap_or_default(),
            );
            let dur_a = a.duration_secs.unwrap_or_default();
            let dur_b = b.duration_secs.unwrap_or_default();

            if self.thresholds.title_matches(title_score)
                && self.thresholds.artist_matches(artist_score)
                && self.thresholds.duration_within(dur_a, dur_b)
            {
                return Some(format!(
                    "title {:.2} / artist {:.2}, {}s apart",
                    title_score,
                    artist_score,
                    dur_a.abs_diff(dur_b)
                ));
            }
        }

        if key_a == key_b {
            return Some("exact artist/title key match".to_string());
        }

        None
    }
}
