//! Ratchet Engine
//!
//! An asynchronous job execution engine: callers enqueue named units of work
//! with a payload, the engine dispatches them to registered handlers, retries
//! failures with exponential backoff up to a configured limit, and can
//! recover in-flight work after a restart.
//!
//! Architecture:
//! - Configuration: attempt ceiling and backoff tuning, from env or defaults
//! - Repository: the `JobStore` contract plus an in-memory reference adapter
//! - Registry: named handlers invoked with the job payload
//! - Events: lifecycle notifications (start, done, failed, recover)
//! - Scheduler: per-job dispatch tasks with backoff-delayed retries
//! - Runner: the public façade tying the above together
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ratchet_engine::{FnHandler, MemoryJobStore, Runner};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> ratchet_engine::Result<()> {
//!     let runner = Runner::new(Arc::new(MemoryJobStore::new()));
//!
//!     runner.register(
//!         "send-email",
//!         FnHandler::new(|payload| async move {
//!             println!("sending {payload}");
//!             Ok(json!({ "sent": true }))
//!         }),
//!     )?;
//!
//!     let job = runner.add("send-email", json!({ "to": "user@example.com" }), None).await?;
//!     println!("enqueued job {}", job.id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod registry;
pub mod repository;
pub mod runner;
pub mod scheduler;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use events::JobEventKind;
pub use registry::{FnHandler, HandlerRegistry, JobHandler};
pub use repository::{JobStore, MemoryJobStore, StoreError};
pub use runner::Runner;

pub use ratchet_core::domain::job::{Job, JobStatus};
pub use ratchet_core::dto::job::{EnqueueOptions, JobFilter};
