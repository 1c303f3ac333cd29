use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by the ledger and context stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted record no longer exists, e.g. it was deleted by a
    /// concurrent turn between lookup and mutation.
    #[error("record not found: {0}")]
    NotFound(Uuid),

    /// The persistence layer is unreachable or rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Failures the resolver cannot turn into a user-visible [`crate::Outcome`].
///
/// Validation problems and misses never land here; they become outcomes.
/// Only operational store failures propagate as errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("ledger operation failed: {0}")]
    Store(#[from] StoreError),
}
