use thiserror::Error;

/// Failure of a backend or metadata operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("object storage error: {0}")]
    ObjectStore(#[from] s3::error::S3Error),

    #[error("object storage answered {status} for '{key}'")]
    Status { key: String, status: u16 },

    #[error("'{0}' not found")]
    NotFound(String),

    #[error("invalid key '{0}'")]
    InvalidKey(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
