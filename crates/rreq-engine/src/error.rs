use rreq_store::StoreError;
use rreq_validate::ValidationError;
use thiserror::Error;

/// Failure surface of the lifecycle and query services.
///
/// Validation failures are caller-recoverable and never partially apply;
/// not-found is deliberately a distinct kind so callers can tell bad input
/// from a missing resource; conflicts mean the caller's view of the request
/// is stale and must be re-read.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("version conflict: expected {expected}, found {actual}")]
    Conflict { expected: i64, actual: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
