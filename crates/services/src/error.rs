//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted by the progress store's explicit persistence calls.
///
/// Only `flush` and `clear` surface these. The everyday mutation and load
/// paths never fail outward: corrupt blobs degrade to an empty record and
/// background write failures are logged, so the learner keeps a working
/// session either way.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("progress record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}
