//! Error types for the engine façade

use thiserror::Error;

use crate::repository::StoreError;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by the [`Runner`](crate::Runner) façade
///
/// Handler failures never surface here; they stay local to the job and are
/// reported through the job record and the `Failed` event.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A handler was registered under an empty name
    #[error("handler name must not be empty")]
    EmptyName,

    /// The storage adapter could not complete a read or write
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
