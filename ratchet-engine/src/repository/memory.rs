//! In-memory job store
//!
//! Reference implementation of the storage contract. Backs the test suite
//! and small single-process deployments; durable adapters live in their own
//! crates.

use async_trait::async_trait;
use ratchet_core::domain::job::{Job, JobStatus};
use ratchet_core::dto::job::JobFilter;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::jobs::{JobStore, StoreError};

struct Entry {
    /// Insertion sequence; orders listings when creation timestamps collide
    seq: u64,
    job: Job,
}

/// In-memory implementation of [`JobStore`]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Entry>>,
    next_seq: AtomicU64,
}

impl MemoryJobStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Uuid, Entry>>, StoreError> {
        self.jobs
            .read()
            .map_err(|e| StoreError::Backend(format!("job table lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Entry>>, StoreError> {
        self.jobs
            .write()
            .map_err(|e| StoreError::Backend(format!("job table lock poisoned: {}", e)))
    }

    /// Applies `mutate` to the job under the write lock, bumping `updated_at`
    fn update<F>(&self, id: Uuid, mutate: F) -> Result<u32, StoreError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.write()?;
        let entry = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        mutate(&mut entry.job);
        entry.job.updated_at = chrono::Utc::now();

        Ok(entry.job.attempts)
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(
        &self,
        name: &str,
        payload: serde_json::Value,
        max_attempts: u32,
    ) -> Result<Job, StoreError> {
        let job = Job::new(name, payload, max_attempts);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        self.write()?.insert(
            job.id,
            Entry {
                seq,
                job: job.clone(),
            },
        );

        Ok(job)
    }

    async fn get(&self, id: Uuid) -> Result<Job, StoreError> {
        self.read()?
            .get(&id)
            .map(|entry| entry.job.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let jobs = self.read()?;

        let mut matches: Vec<(u64, Job)> = jobs
            .values()
            .filter(|entry| {
                filter
                    .statuses
                    .as_ref()
                    .is_none_or(|statuses| statuses.contains(&entry.job.status))
            })
            .map(|entry| (entry.seq, entry.job.clone()))
            .collect();

        // Newest-created first
        matches.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        Ok(matches
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|(_, job)| job)
            .collect())
    }

    async fn mark_running(&self, id: Uuid) -> Result<(), StoreError> {
        self.update(id, |job| job.status = JobStatus::Running)?;
        Ok(())
    }

    async fn mark_done(
        &self,
        id: Uuid,
        result: Option<serde_json::Value>,
    ) -> Result<(), StoreError> {
        self.update(id, |job| {
            job.status = JobStatus::Done;
            job.result = result;
        })?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error.to_string());
        })?;
        Ok(())
    }

    async fn inc_attempts(&self, id: Uuid) -> Result<u32, StoreError> {
        self.update(id, |job| job.attempts += 1)
    }

    async fn reset_status(&self, id: Uuid, status: JobStatus) -> Result<(), StoreError> {
        self.update(id, |job| job.status = status)?;
        Ok(())
    }
}
