//! Configuration for the migration engine.

use std::time::Duration;

/// Configuration for a migration run.
///
/// Passed into the orchestrator at construction; there is no module-level
/// state. Batch size is fixed for the whole run: small enough to bound
/// lock/transaction scope, large enough to amortize round trips.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Rows fetched per batch.
    pub batch_size: usize,
    /// Whether to migrate all models concurrently (one worker per model).
    pub concurrently: bool,
    /// Retry policy for transient store failures.
    pub retry: RetryPolicy,
    /// Whether to re-encrypt values that already decrypt cleanly, for key or
    /// scheme rotation. When false, such values are skipped.
    pub reencrypt_existing: bool,
    /// Whether to classify and count without issuing any updates.
    pub dry_run: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            concurrently: false,
            retry: RetryPolicy::default(),
            reencrypt_existing: false,
            dry_run: false,
        }
    }
}

impl MigrationConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable concurrent per-model migration.
    pub fn concurrently(mut self, concurrently: bool) -> Self {
        self.concurrently = concurrently;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable re-encryption of already-encrypted values.
    pub fn reencrypt_existing(mut self, reencrypt: bool) -> Self {
        self.reencrypt_existing = reencrypt;
        self
    }

    /// Enable dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Bounded exponential backoff for transient store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles per subsequent failure.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default delays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts (clamped to at least 1).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the base delay.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the delay cap.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// A policy that never sleeps, for tests.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            max_attempts: attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to sleep after the given failed attempt (1-based).
    ///
    /// `base * 2^(attempt-1)`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(10);
        let base_ms = self.base_delay.as_millis().min(u64::MAX as u128) as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay_ms).min(self.max_delay)
    }
}
