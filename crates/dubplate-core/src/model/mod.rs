pub mod entry;
pub mod group;
pub mod ids;
pub mod release;
pub mod report;
pub mod track;

pub use entry::{BucketEntry, EntryMetadata};
pub use group::DuplicateGroup;
pub use ids::{RemovalId, TrackId};
pub use release::ReleaseMatch;
pub use report::ValidationReport;
pub use track::{RemovalNote, RemovalRecord, RemovalState, TrackRecord, TrackStatus};
