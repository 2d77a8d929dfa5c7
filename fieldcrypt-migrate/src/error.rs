//! Error types for the migration engine.

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur during migration operations.
///
/// Only store-level problems surface here. Per-field problems (a value that
/// is neither plaintext nor valid ciphertext) are data, not errors: they are
/// recorded on the row's outcome and the batch continues.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Transient store failure on read or write. Retried with bounded
    /// backoff at the runner level; fatal for the model once retries exhaust.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Non-transient store failure (bad SQL, missing table, type mismatch).
    /// Never retried.
    #[error("store error: {0}")]
    Store(String),

    /// The store broke the pagination contract (rows out of cursor order, or
    /// at or below the requested lower bound).
    #[error("cursor order violation in table `{table}`: {message}")]
    CursorOrder {
        /// Table being paged.
        table: String,
        /// What the store returned.
        message: String,
    },

    /// A migration worker task panicked or was aborted.
    #[error("worker task failed for model `{0}`")]
    WorkerFailed(String),
}

impl MigrationError {
    /// Create a transient store error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a non-transient store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a cursor-order violation error.
    pub fn cursor_order(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CursorOrder {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Check if this error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
