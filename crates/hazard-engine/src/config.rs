//! Configuration for the aggregation engine.

use std::time::Duration;

/// Configuration for batching and parallel dispatch.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of concurrent fetch workers.
    pub workers: usize,
    /// Points per remote call for fixed-value queries.
    pub fixed_value_batch_size: usize,
    /// Points per remote call for full-history queries.
    pub full_history_batch_size: usize,
    /// A worker re-authenticates once its token is older than this.
    pub session_budget: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            fixed_value_batch_size: 100,
            full_history_batch_size: 1,
            session_budget: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("HAZARD_WORKERS") {
            if let Ok(n) = val.parse() {
                config.workers = n;
            }
        }

        if let Ok(val) = std::env::var("HAZARD_BATCH_SIZE") {
            if let Ok(n) = val.parse() {
                config.fixed_value_batch_size = n;
            }
        }

        if let Ok(val) = std::env::var("HAZARD_SESSION_BUDGET_SECS") {
            if let Ok(secs) = val.parse() {
                config.session_budget = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }

        if self.fixed_value_batch_size == 0 || self.full_history_batch_size == 0 {
            return Err("batch sizes must be > 0".to_string());
        }

        if self.session_budget.is_zero() {
            return Err("session_budget must be > 0".to_string());
        }

        Ok(())
    }
}
