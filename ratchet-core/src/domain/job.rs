//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job execution record
///
/// Structure shared between the engine (drives the lifecycle) and storage
/// adapters (persist it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub status: JobStatus,
    pub payload: serde_json::Value,
    pub attempts: u32,
    pub max_attempts: u32,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    /// Creates a fresh job record in its initial state
    ///
    /// Assigns a new id, zero attempts and `Pending` status. Storage adapters
    /// call this from `create` so every backend produces identical records.
    pub fn new(name: impl Into<String>, payload: serde_json::Value, max_attempts: u32) -> Self {
        let now = chrono::Utc::now();

        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: JobStatus::Pending,
            payload,
            attempts: 0,
            max_attempts,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Awaiting or retrying execution
    Pending,
    /// Handler currently executing
    Running,
    /// Terminal: handler returned successfully
    Done,
    /// Terminal: retries exhausted
    Failed,
}

impl JobStatus {
    /// Whether this status admits no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Whether the lifecycle permits moving from this status to `next`
    ///
    /// `Running -> Pending` covers both the retry requeue and the startup
    /// recovery sweep. No transition leaves a terminal status.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Done)
                | (JobStatus::Running, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Pending)
        )
    }

    /// Canonical text form, as stored by text-encoding adapters
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Parses the canonical text form back into a status
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "done" => Some(JobStatus::Done),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
