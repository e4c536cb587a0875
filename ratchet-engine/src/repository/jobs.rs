//! Job storage contract
//!
//! The durable record of jobs the engine reads and writes through. Every
//! state transition is persisted here before the corresponding in-memory
//! snapshot mutates or an event fires.

use async_trait::async_trait;
use ratchet_core::domain::job::{Job, JobStatus};
use ratchet_core::dto::job::JobFilter;
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by storage adapters
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mutating or reading operation referenced an unknown job id
    #[error("job not found: {0}")]
    NotFound(Uuid),

    /// The backend could not complete the operation
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage adapter contract
///
/// All mutating operations on a missing id return [`StoreError::NotFound`].
/// Listings are ordered newest-created first and an empty store yields an
/// empty sequence, never an error.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Creates a job in its initial state
    ///
    /// The stored record has `Pending` status, zero attempts and a freshly
    /// assigned id that is never reused.
    async fn create(
        &self,
        name: &str,
        payload: serde_json::Value,
        max_attempts: u32,
    ) -> Result<Job, StoreError>;

    /// Fetches a job by id
    async fn get(&self, id: Uuid) -> Result<Job, StoreError>;

    /// Lists jobs matching the filter, newest-created first
    async fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError>;

    /// Lists jobs in any of the given statuses, newest-created first
    async fn find_by_status(&self, statuses: &[JobStatus]) -> Result<Vec<Job>, StoreError> {
        self.list(&JobFilter::by_status(statuses.to_vec())).await
    }

    /// Sets status to `Running` and refreshes the update timestamp
    async fn mark_running(&self, id: Uuid) -> Result<(), StoreError>;

    /// Sets status to `Done` and stores the handler's result
    async fn mark_done(
        &self,
        id: Uuid,
        result: Option<serde_json::Value>,
    ) -> Result<(), StoreError>;

    /// Sets status to `Failed` and stores the failure description
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError>;

    /// Atomically increments the attempt count
    ///
    /// Returns the post-increment count so the caller's ceiling check is part
    /// of the same read-modify-write. Adapters must make this atomic at the
    /// storage layer.
    async fn inc_attempts(&self, id: Uuid) -> Result<u32, StoreError>;

    /// Force-sets the status
    ///
    /// Used for the `Running -> Pending` requeue between retry attempts and
    /// for the startup recovery sweep.
    async fn reset_status(&self, id: Uuid, status: JobStatus) -> Result<(), StoreError>;
}
