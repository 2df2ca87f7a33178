use thiserror::Error;

/// Errors produced by the core model and storage layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing or parsing the JSON columns (removal notes) failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A track or ledger row was addressed by an id that matches nothing.
    ///
    /// `mark_track_removed` relies on this to distinguish "updated" from
    /// "silently touched zero rows".
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// A stored value (status, state, timestamp) failed validation on read.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
