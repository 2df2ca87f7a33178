//! Validation engine for dubplate.
//!
//! Implements the duplicate scan, the released-track check against the
//! commercial catalog, and the two-system cleanup that removes flagged
//! entries from the fingerprint bucket and the metadata database.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod bucket;
pub mod catalog;
pub mod cleanup;
pub mod config;
pub mod dedup;
pub mod error;
pub mod resilience;
pub mod similarity;
pub mod text;
pub mod validate;

pub use bucket::{BucketClient, BucketStore};
pub use catalog::{CatalogClient, LookupOutcome, ReleaseChecker, ReleaseScan};
pub use cleanup::{CleanupAction, CleanupExecutor, CleanupOutcome, ReconcileAction, ReconcileOutcome};
pub use config::{Config, MatchThresholds};
pub use dedup::{CanonicalPolicy, DuplicateDetector, EarliestCreated, FirstSeen};
pub use error::{AuditError, AuditResult};
pub use validate::{RunOptions, RunOutcome, Validator};
