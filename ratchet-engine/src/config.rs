//! Engine configuration
//!
//! Defines the tunable parameters of the engine: the default attempt ceiling
//! and the retry backoff curve.

use std::time::Duration;

/// Engine configuration
///
/// The backoff defaults reproduce the documented retry spacing: 2 s after the
/// first failure, doubling per attempt, capped at 30 s.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Attempt ceiling applied when a job is enqueued without an explicit one
    pub default_max_attempts: u32,

    /// Base unit of the backoff curve; attempt `n` waits `base * 2^n`
    pub backoff_base: Duration,

    /// Upper bound on any single retry delay
    pub backoff_cap: Duration,
}

impl EngineConfig {
    /// Creates a configuration with defaults
    pub fn new() -> Self {
        Self {
            default_max_attempts: 3,
            backoff_base: Duration::from_millis(1000),
            backoff_cap: Duration::from_millis(30_000),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables, all optional:
    /// - RATCHET_MAX_ATTEMPTS (default: 3)
    /// - RATCHET_BACKOFF_BASE_MS (default: 1000)
    /// - RATCHET_BACKOFF_CAP_MS (default: 30000)
    pub fn from_env() -> Self {
        let defaults = Self::new();

        let default_max_attempts = std::env::var("RATCHET_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.default_max_attempts);

        let backoff_base = std::env::var("RATCHET_BACKOFF_BASE_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.backoff_base);

        let backoff_cap = std::env::var("RATCHET_BACKOFF_CAP_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.backoff_cap);

        Self {
            default_max_attempts,
            backoff_base,
            backoff_cap,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_max_attempts == 0 {
            anyhow::bail!("default_max_attempts must be greater than 0");
        }

        if self.backoff_base.is_zero() {
            anyhow::bail!("backoff_base must be greater than 0");
        }

        if self.backoff_cap < self.backoff_base {
            anyhow::bail!("backoff_cap must be at least backoff_base");
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
