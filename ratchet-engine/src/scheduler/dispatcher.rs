//! Job dispatcher
//!
//! Drives one job instance through handler execution, failure classification
//! and backoff-delayed retry. Every state transition writes through the
//! storage adapter before the in-memory snapshot mutates, and events fire
//! only after the corresponding write commits.

use ratchet_core::domain::job::{Job, JobStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::events::{EventBus, JobEventKind};
use crate::registry::HandlerRegistry;
use crate::repository::{JobStore, StoreError};

/// Dispatcher that executes jobs and schedules their retries
pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    registry: Arc<HandlerRegistry>,
    events: Arc<EventBus>,
    config: EngineConfig,
}

impl Dispatcher {
    /// Creates a new dispatcher
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<HandlerRegistry>,
        events: Arc<EventBus>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            registry,
            events,
            config,
        }
    }

    /// Submits a job cycle to the executor without blocking the caller
    ///
    /// A storage failure aborts that one cycle; it is routed to the process
    /// log because no caller is left to observe it.
    pub fn spawn(self: &Arc<Self>, job: Job) {
        let dispatcher = Arc::clone(self);

        tokio::spawn(async move {
            let job_id = job.id;
            if let Err(e) = dispatcher.process(job).await {
                error!("Job {} cycle aborted by storage failure: {}", job_id, e);
            }
        });
    }

    /// Drives one job to a terminal outcome, honoring backoff between attempts
    pub async fn process(&self, mut job: Job) -> Result<(), StoreError> {
        loop {
            debug_assert!(job.status.can_transition_to(JobStatus::Running));

            self.store.mark_running(job.id).await?;
            job.status = JobStatus::Running;
            job.updated_at = chrono::Utc::now();
            self.events.emit(JobEventKind::Start, &job);

            debug!("Job {} attempt {} starting", job.id, job.attempts + 1);

            let outcome = match self.registry.get(&job.name) {
                Some(handler) => handler.run(job.payload.clone()).await,
                None => Err(anyhow::anyhow!(
                    "No handler registered for job type: {}",
                    job.name
                )),
            };

            match outcome {
                Ok(result) => {
                    self.store.mark_done(job.id, Some(result.clone())).await?;
                    job.status = JobStatus::Done;
                    job.result = Some(result);
                    job.updated_at = chrono::Utc::now();
                    self.events.emit(JobEventKind::Done, &job);

                    info!("Job {} completed successfully", job.id);
                    return Ok(());
                }
                Err(err) => {
                    let attempts = self.store.inc_attempts(job.id).await?;
                    job.attempts = attempts;

                    if attempts >= job.max_attempts {
                        let message = format!("{:#}", err);
                        self.store.mark_failed(job.id, &message).await?;
                        job.status = JobStatus::Failed;
                        job.error = Some(message);
                        job.updated_at = chrono::Utc::now();
                        self.events.emit(JobEventKind::Failed, &job);

                        error!(
                            "Job {} failed permanently after {} attempt(s): {:#}",
                            job.id, attempts, err
                        );
                        return Ok(());
                    }

                    // The job reads Pending in storage for the whole wait
                    self.store.reset_status(job.id, JobStatus::Pending).await?;
                    job.status = JobStatus::Pending;
                    job.updated_at = chrono::Utc::now();

                    let delay = self.retry_delay(attempts);
                    warn!(
                        "Job {} attempt {}/{} failed: {:#}; retrying in {:?}",
                        job.id, attempts, job.max_attempts, err, delay
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Backoff before the attempt after `attempts` failures
    ///
    /// `min(base * 2^attempts, cap)`, computed from the already-incremented
    /// count: 2 s after the first failure, then 4 s, 8 s, up to the cap.
    fn retry_delay(&self, attempts: u32) -> Duration {
        let base = self.config.backoff_base.as_millis() as u64;
        let cap = self.config.backoff_cap.as_millis() as u64;
        let factor = 1u64.checked_shl(attempts).unwrap_or(u64::MAX);

        Duration::from_millis(base.saturating_mul(factor).min(cap))
    }
}
