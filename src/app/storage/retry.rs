//! Lock-contention retry for storage writes
//!
//! SQLite reports `SQLITE_BUSY` / `SQLITE_LOCKED` when another process holds
//! the write lock past the connection's busy timeout. Every write goes through
//! [`with_lock_retry`], which retries only those failures with exponential
//! backoff and surfaces [`Error::LockContention`] once attempts run out.

use crate::config::RetryConfig;
use crate::{Error, Result};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Fixed retry/backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Policy that never sleeps, for tests
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Backoff before attempt `attempt + 1` (attempt is 1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Run `operation`, retrying lock-contention failures per `policy`
///
/// Non-lock errors are returned immediately. Blocking sleep is intentional:
/// the worker is single-threaded and waits at I/O boundaries only.
pub fn with_lock_retry<T, F>(policy: &RetryPolicy, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation() {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_lock_contention() => {
                if attempt >= policy.max_attempts {
                    error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        "Database still locked, giving up"
                    );
                    return Err(Error::lock_contention(operation_name, attempt));
                }

                let backoff = policy.backoff_for(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis(),
                    "Database locked, will retry after backoff"
                );
                std::thread::sleep(backoff);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_error() -> Error {
        Error::from(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        ))
    }

    #[test]
    fn test_retry_succeeds_first_attempt() {
        let mut calls = 0;
        let result = with_lock_retry(&RetryPolicy::immediate(3), "test_op", || {
            calls += 1;
            Ok::<_, Error>(42)
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_retry_succeeds_after_lock_errors() {
        let mut calls = 0;
        let result = with_lock_retry(&RetryPolicy::immediate(5), "test_op", || {
            calls += 1;
            if calls < 3 { Err(busy_error()) } else { Ok(7) }
        });

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<()> = with_lock_retry(&RetryPolicy::immediate(4), "save_meet", || {
            calls += 1;
            Err(busy_error())
        });

        assert_eq!(calls, 4);
        match result {
            Err(Error::LockContention {
                operation,
                attempts,
            }) => {
                assert_eq!(operation, "save_meet");
                assert_eq!(attempts, 4);
            }
            other => panic!("Expected LockContention, got {:?}", other),
        }
    }

    #[test]
    fn test_non_lock_error_fails_immediately() {
        let mut calls = 0;
        let result: Result<()> = with_lock_retry(&RetryPolicy::immediate(5), "test_op", || {
            calls += 1;
            Err(Error::configuration("other error"))
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(25),
            max_backoff: Duration::from_millis(150),
        };

        assert_eq!(policy.backoff_for(1), Duration::from_millis(25));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(50));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(4), Duration::from_millis(150));
        assert_eq!(policy.backoff_for(10), Duration::from_millis(150));
    }
}
