//! Bounded retry for fallible store and database operations.
//!
//! Attempts are sequential and immediate: pacing between writes is the
//! throttle's job, so there is no backoff here. Every error kind is retried
//! the same way; callers decide which operations are safe to wrap.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BotError;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first (default: 3).
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Executor for retry operations.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new RetryExecutor with the given configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create an executor that makes at most `max_attempts` attempts.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(RetryConfig { max_attempts })
    }

    /// Configured attempt limit.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Run `operation` until it succeeds or the attempt limit is reached.
    ///
    /// A zero attempt limit fails with [`BotError::InvalidArgument`] without
    /// invoking `operation`. Errors from all but the final attempt are
    /// discarded; the final attempt's error is returned unchanged.
    pub fn execute<T, E, F>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: From<BotError>,
    {
        let max_attempts = self.config.max_attempts;
        if max_attempts == 0 {
            return Err(BotError::InvalidArgument {
                reason: "max_attempts must be at least 1".to_string(),
            }
            .into());
        }

        let mut attempt = 1u32;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(_) if attempt < max_attempts => {
                    debug!(attempt, max_attempts, "attempt failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Run `operation` at most `max_attempts` times. See [`RetryExecutor::execute`].
pub fn retry<T, E, F>(operation: F, max_attempts: u32) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: From<BotError>,
{
    RetryExecutor::with_max_attempts(max_attempts).execute(operation)
}
