//! Store errors

use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {table} id={id}")]
    NotFound { table: &'static str, id: i64 },

    #[error("Invalid record in {table}: {reason}")]
    Invalid { table: &'static str, reason: String },

    #[error("Collection not found: {0}")]
    MissingCollection(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result of store operations
pub type StoreResult<T> = Result<T, StoreError>;
