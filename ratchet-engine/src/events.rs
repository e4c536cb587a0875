//! Lifecycle event notifications
//!
//! The engine's only outward push interface. Listeners receive the job
//! snapshot taken after the corresponding storage write committed, in
//! registration order. A panicking listener is contained and logged so the
//! remaining listeners still run.

use ratchet_core::domain::job::Job;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// The four kinds of lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobEventKind {
    /// An attempt is starting (job just moved to `Running`)
    Start,
    /// The job reached `Done`
    Done,
    /// The job reached `Failed`
    Failed,
    /// A `Running` job was reset to `Pending` by the recovery sweep
    Recover,
}

type Listener = Arc<dyn Fn(&Job) + Send + Sync>;

/// Per-kind ordered listener lists, owned by the runner instance
pub struct EventBus {
    listeners: RwLock<HashMap<JobEventKind, Vec<Listener>>>,
}

impl EventBus {
    /// Creates a bus with no listeners
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a listener for `kind`
    pub fn subscribe<F>(&self, kind: JobEventKind, listener: F)
    where
        F: Fn(&Job) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Invokes every listener for `kind` with the job snapshot
    pub fn emit(&self, kind: JobEventKind, job: &Job) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(job))).is_err() {
                warn!("{:?} listener panicked for job {}", kind, job.id);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
