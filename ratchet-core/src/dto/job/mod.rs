//! Job DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;

/// Options accepted when enqueueing a job
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EnqueueOptions {
    /// Attempt ceiling for this job; falls back to the engine default (3)
    pub max_attempts: Option<u32>,
}

/// Query filter for job listings
///
/// An empty filter matches every job. Results are always ordered
/// newest-created first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    /// Restrict to these statuses; `None` matches all statuses
    pub statuses: Option<Vec<JobStatus>>,
    /// Maximum number of jobs to return
    pub limit: Option<usize>,
    /// Number of jobs to skip from the newest end
    pub offset: usize,
}

impl JobFilter {
    /// Filter restricted to the given statuses
    pub fn by_status(statuses: impl Into<Vec<JobStatus>>) -> Self {
        Self {
            statuses: Some(statuses.into()),
            ..Self::default()
        }
    }
}
