use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The connection pool has been shut down.
    #[error("Connection pool closed")]
    PoolClosed,

    /// The connection pool could not be built or hand out a connection.
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// A connection came back to the pool with a transaction still open.
    #[error("Connection returned with an open transaction")]
    DirtyConnection,

    /// A blocking database task panicked or was cancelled.
    #[error("Database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
