//! Runner façade
//!
//! Public entry point of the engine. Owns the handler registry, the event
//! bus and the dispatcher; storage is injected at construction so backends
//! stay pluggable.

use ratchet_core::domain::job::{Job, JobStatus};
use ratchet_core::dto::job::{EnqueueOptions, JobFilter};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{EventBus, JobEventKind};
use crate::registry::{HandlerRegistry, JobHandler};
use crate::repository::JobStore;
use crate::scheduler::Dispatcher;

/// Job execution engine façade
///
/// Enqueued jobs are dispatched asynchronously; `add` returns as soon as the
/// job record is durably created, not when it has executed.
pub struct Runner {
    store: Arc<dyn JobStore>,
    registry: Arc<HandlerRegistry>,
    events: Arc<EventBus>,
    dispatcher: Arc<Dispatcher>,
    config: EngineConfig,
}

impl Runner {
    /// Creates a runner over the given storage adapter with default config
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Creates a runner with an explicit configuration
    pub fn with_config(store: Arc<dyn JobStore>, config: EngineConfig) -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        let events = Arc::new(EventBus::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&events),
            config.clone(),
        ));

        Self {
            store,
            registry,
            events,
            dispatcher,
            config,
        }
    }

    /// Registers a handler under `name`, replacing any previous one
    ///
    /// Returns the runner for chaining. An empty name is a configuration
    /// error.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: impl JobHandler + 'static,
    ) -> Result<&Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(EngineError::EmptyName);
        }

        debug!("Registered handler for job type '{}'", name);
        self.registry.insert(name, Arc::new(handler));
        Ok(self)
    }

    /// Subscribes a listener to a lifecycle event
    ///
    /// Listeners for a kind run in registration order; a panicking listener
    /// does not prevent the rest from running. Returns the runner for
    /// chaining.
    pub fn on<F>(&self, kind: JobEventKind, listener: F) -> &Self
    where
        F: Fn(&Job) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, listener);
        self
    }

    /// Enqueues a job and hands it to the dispatcher
    ///
    /// Returns the freshly created `Pending` record; the handler has not
    /// necessarily started (or even begun to start) when this returns. Fails
    /// only if the storage write fails.
    pub async fn add(
        &self,
        name: impl Into<String>,
        payload: serde_json::Value,
        options: Option<EnqueueOptions>,
    ) -> Result<Job> {
        let name = name.into();
        let max_attempts = options
            .and_then(|opts| opts.max_attempts)
            .unwrap_or(self.config.default_max_attempts);

        let job = self.store.create(&name, payload, max_attempts).await?;
        info!("Job created: {} ('{}')", job.id, job.name);

        self.dispatcher.spawn(job.clone());
        Ok(job)
    }

    /// Resumes jobs left unfinished by a prior process instance
    ///
    /// Every `Running` job is reset to `Pending` (emitting a `Recover` event
    /// per job) before any job is re-dispatched; the combined
    /// `Pending` + `Running` set is then handed to the dispatcher. Returns
    /// how many jobs were resumed. Attempt counts are preserved across
    /// recovery.
    ///
    /// Call once at startup, before `add` can race against the same jobs;
    /// repeated calls may double-dispatch a job, which the at-least-once
    /// contract permits.
    pub async fn recover(&self) -> Result<usize> {
        let mut jobs = self
            .store
            .find_by_status(&[JobStatus::Pending, JobStatus::Running])
            .await?;

        for job in jobs.iter_mut() {
            if job.status != JobStatus::Running {
                continue;
            }

            self.store.reset_status(job.id, JobStatus::Pending).await?;
            job.status = JobStatus::Pending;
            job.updated_at = chrono::Utc::now();
            self.events.emit(JobEventKind::Recover, job);

            debug!("Job {} reset from running to pending", job.id);
        }

        let count = jobs.len();
        for job in jobs {
            self.dispatcher.spawn(job);
        }

        info!("Resumed {} interrupted job(s)", count);
        Ok(count)
    }

    /// Lists jobs through the storage adapter, newest-created first
    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        Ok(self.store.list(filter).await?)
    }

    /// Fetches a single job by id
    pub async fn get_job(&self, id: Uuid) -> Result<Job> {
        Ok(self.store.get(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FnHandler;
    use crate::repository::MemoryJobStore;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    async fn wait_for_status(store: &Arc<MemoryJobStore>, id: Uuid, status: JobStatus) -> Job {
        loop {
            let job = store.get(id).await.unwrap();
            if job.status == status {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn failing_handler(calls: Arc<Mutex<Vec<Instant>>>) -> FnHandler {
        FnHandler::new(move |_| {
            let calls = Arc::clone(&calls);
            async move {
                calls.lock().unwrap().push(Instant::now());
                Err(anyhow::anyhow!("flaky downstream"))
            }
        })
    }

    #[tokio::test]
    async fn test_register_rejects_empty_name() {
        let runner = Runner::new(Arc::new(MemoryJobStore::new()));
        let result = runner.register("", FnHandler::new(|_| async { Ok(json!(null)) }));
        assert!(matches!(result, Err(EngineError::EmptyName)));
    }

    #[tokio::test]
    async fn test_register_chains() {
        let runner = Runner::new(Arc::new(MemoryJobStore::new()));
        runner
            .register("a", FnHandler::new(|_| async { Ok(json!(null)) }))
            .unwrap()
            .register("b", FnHandler::new(|_| async { Ok(json!(null)) }))
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_returns_pending_snapshot_immediately() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());
        runner
            .register("noop", FnHandler::new(|_| async { Ok(json!(null)) }))
            .unwrap();

        let job = runner.add("noop", json!({"k": 1}), None).await.unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_attempts, 3);
        assert_eq!(job.payload, json!({"k": 1}));

        wait_for_status(&store, job.id, JobStatus::Done).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_second_attempt() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());

        let invocations = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&invocations);
        runner
            .register(
                "flaky",
                FnHandler::new(move |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(anyhow::anyhow!("first attempt loses"))
                        } else {
                            Ok(json!({"ok": true}))
                        }
                    }
                }),
            )
            .unwrap();

        let job = runner.add("flaky", json!(null), None).await.unwrap();
        let done = wait_for_status(&store, job.id, JobStatus::Done).await;

        assert_eq!(done.attempts, 1);
        assert_eq!(done.result, Some(json!({"ok": true})));
        assert!(done.error.is_none());
        assert_eq!(invocations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_delays_for_three_attempts() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());

        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        runner
            .register("always-fails", failing_handler(Arc::clone(&calls)))
            .unwrap();

        let job = runner.add("always-fails", json!(null), None).await.unwrap();
        let failed = wait_for_status(&store, job.id, JobStatus::Failed).await;

        assert_eq!(failed.attempts, 3);
        assert_eq!(failed.error.as_deref(), Some("flaky downstream"));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_millis(2000));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_delays_cap_at_thirty_seconds() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());

        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        runner
            .register("always-fails", failing_handler(Arc::clone(&calls)))
            .unwrap();

        let job = runner
            .add(
                "always-fails",
                json!(null),
                Some(EnqueueOptions {
                    max_attempts: Some(5),
                }),
            )
            .await
            .unwrap();
        let failed = wait_for_status(&store, job.id, JobStatus::Failed).await;

        assert_eq!(failed.attempts, 5);

        let calls = calls.lock().unwrap();
        let gaps: Vec<u64> = calls
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_millis() as u64)
            .collect();
        assert_eq!(gaps, [2000, 4000, 8000, 16000, 30000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_never_exceed_max_attempts() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());

        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        runner
            .register("always-fails", failing_handler(Arc::clone(&calls)))
            .unwrap();

        let job = runner
            .add(
                "always-fails",
                json!(null),
                Some(EnqueueOptions {
                    max_attempts: Some(2),
                }),
            )
            .await
            .unwrap();
        let failed = wait_for_status(&store, job.id, JobStatus::Failed).await;

        assert_eq!(failed.attempts, failed.max_attempts);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_handler_surfaces_as_failed_job() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());

        let job = runner.add("unregistered", json!(null), None).await.unwrap();
        let failed = wait_for_status(&store, job.id, JobStatus::Failed).await;

        assert_eq!(
            failed.error.as_deref(),
            Some("No handler registered for job type: unregistered")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_fire_across_the_lifecycle() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());

        let seen: Arc<Mutex<Vec<(JobEventKind, JobStatus)>>> = Arc::new(Mutex::new(Vec::new()));
        for kind in [JobEventKind::Start, JobEventKind::Done, JobEventKind::Failed] {
            let seen = Arc::clone(&seen);
            runner.on(kind, move |job| {
                seen.lock().unwrap().push((kind, job.status));
            });
        }

        runner
            .register("noop", FnHandler::new(|_| async { Ok(json!("fine")) }))
            .unwrap();

        let job = runner.add("noop", json!(null), None).await.unwrap();
        wait_for_status(&store, job.id, JobStatus::Done).await;

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            [
                (JobEventKind::Start, JobStatus::Running),
                (JobEventKind::Done, JobStatus::Done),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_resets_running_and_resumes_both() {
        let store = Arc::new(MemoryJobStore::new());

        // State left behind by a previous process: one job waiting, one
        // interrupted mid-attempt with its attempt count intact.
        let waiting = store.create("noop", json!(null), 3).await.unwrap();
        let interrupted = store.create("noop", json!(null), 3).await.unwrap();
        store.inc_attempts(interrupted.id).await.unwrap();
        store.inc_attempts(interrupted.id).await.unwrap();
        store.mark_running(interrupted.id).await.unwrap();

        let runner = Runner::new(store.clone());
        runner
            .register("noop", FnHandler::new(|_| async { Ok(json!("recovered")) }))
            .unwrap();

        let recovered: Arc<Mutex<Vec<(Uuid, u32)>>> = Arc::new(Mutex::new(Vec::new()));
        {
            let recovered = Arc::clone(&recovered);
            runner.on(JobEventKind::Recover, move |job| {
                recovered.lock().unwrap().push((job.id, job.attempts));
            });
        }

        let count = runner.recover().await.unwrap();
        assert_eq!(count, 2);

        // Only the interrupted job produces a recover event, attempts intact
        assert_eq!(*recovered.lock().unwrap(), [(interrupted.id, 2)]);

        let waiting = wait_for_status(&store, waiting.id, JobStatus::Done).await;
        let interrupted = wait_for_status(&store, interrupted.id, JobStatus::Done).await;

        assert_eq!(waiting.attempts, 0);
        assert_eq!(interrupted.attempts, 2);
        assert_eq!(interrupted.result, Some(json!("recovered")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_listing_excludes_terminal_jobs() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());

        runner
            .register("noop", FnHandler::new(|_| async { Ok(json!(null)) }))
            .unwrap();

        let finished = runner.add("noop", json!(null), None).await.unwrap();
        wait_for_status(&store, finished.id, JobStatus::Done).await;

        // Created directly in the store, never dispatched: stays pending
        let parked = store.create("parked", json!(null), 3).await.unwrap();

        let active = runner
            .list_jobs(&JobFilter::by_status([
                JobStatus::Pending,
                JobStatus::Running,
            ]))
            .await
            .unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, parked.id);
    }

    #[tokio::test]
    async fn test_get_job_reads_through_to_store() {
        let store = Arc::new(MemoryJobStore::new());
        let runner = Runner::new(store.clone());

        let job = store.create("j", json!(null), 3).await.unwrap();
        let fetched = runner.get_job(job.id).await.unwrap();
        assert_eq!(fetched.id, job.id);

        let missing = runner.get_job(Uuid::new_v4()).await;
        assert!(matches!(
            missing,
            Err(EngineError::Store(crate::repository::StoreError::NotFound(_)))
        ));
    }
}
