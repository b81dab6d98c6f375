//! Error types for query execution.

use oxide_query_core::QueryError;
use thiserror::Error;

/// Errors raised while building, executing or configuring queries.
#[derive(Debug, Error)]
pub enum Error {
    /// The query could not be built.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A `*_or_fail` terminal found nothing.
    #[error("{0}")]
    RecordNotFound(String),

    /// `one_or_fail` found more than one row.
    #[error("Expected exactly one record, found more than one ({0} fetched)")]
    MultipleRecords(usize),

    /// A named connection is not configured.
    #[error("Unknown connection '{name}'. Available: {}", available.join(", "))]
    UnknownConnection {
        /// Requested connection.
        name: String,
        /// Configured connection names.
        available: Vec<String>,
    },

    /// The configured driver has no session implementation.
    #[error("Unsupported database driver '{0}'")]
    UnsupportedDriver(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file was not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for query execution.
pub type Result<T> = std::result::Result<T, Error>;
