//! Error types for the audit engine.

use thiserror::Error;

/// Errors that can occur while auditing the bucket.
#[derive(Debug, Error)]
pub enum AuditError {
    /// An HTTP request to an external service failed.
    #[error("HTTP error from {service}: {message}")]
    Http { service: String, message: String },

    /// A credential exchange with an external service failed.
    #[error("authentication failed against {service}: {message}")]
    Auth { service: String, message: String },

    /// A response from an external service could not be parsed.
    #[error("parse error from {service}: {message}")]
    Parse { service: String, message: String },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the core storage layer.
    #[error("database error: {0}")]
    Database(#[from] dubplate_core::Error),
}

/// Convenience alias for audit results.
pub type AuditResult<T> = std::result::Result<T, AuditError>;
