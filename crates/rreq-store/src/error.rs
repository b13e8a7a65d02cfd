use thiserror::Error;

/// Storage-layer failure. Propagated to the caller as fatal; the store
/// performs no retry or backoff of its own.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted value no longer parses into its domain type.
    #[error("corrupt {entity} row: {detail}")]
    Corrupt {
        entity: &'static str,
        detail: String,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
