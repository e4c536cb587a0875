//! Handler registry
//!
//! Maps job names to the handlers that perform the actual work. The registry
//! is owned by the runner instance; there is no process-global state.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

/// A unit of work invoked with a job's payload
///
/// Returning `Err` marks the attempt as failed; the engine retries it with
/// backoff until the job's attempt ceiling is reached.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Performs the work for one attempt
    async fn run(&self, payload: Value) -> anyhow::Result<Value>;
}

type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;

/// Adapter turning an async closure into a [`JobHandler`]
///
/// # Example
///
/// ```
/// use ratchet_engine::FnHandler;
///
/// let handler = FnHandler::new(|payload| async move {
///     Ok(payload)
/// });
/// # let _ = handler;
/// ```
pub struct FnHandler {
    f: Box<dyn Fn(Value) -> HandlerFuture + Send + Sync>,
}

impl FnHandler {
    /// Wraps an async closure
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            f: Box::new(move |payload| Box::pin(f(payload))),
        }
    }
}

#[async_trait]
impl JobHandler for FnHandler {
    async fn run(&self, payload: Value) -> anyhow::Result<Value> {
        (self.f)(payload).await
    }
}

/// Registry of named handlers
///
/// Registration is idempotent: inserting under an existing name replaces the
/// previous handler.
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn JobHandler>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a handler under `name`, replacing any previous one
    pub fn insert(&self, name: impl Into<String>, handler: Arc<dyn JobHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), handler);
    }

    /// Looks up the handler registered under `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Whether a handler is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
