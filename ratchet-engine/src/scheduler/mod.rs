//! Scheduler layer
//!
//! This layer drives dispatched jobs from their first attempt to a terminal
//! outcome. Each job cycle runs in its own task; retry waits are timer-based
//! so neither the caller nor other jobs are ever blocked.

pub mod dispatcher;

pub use dispatcher::Dispatcher;
