//! # fieldcrypt-migrate
//!
//! Batched migration engine that encrypts existing column data in place.
//!
//! This crate provides functionality for:
//! - Keyset (cursor) pagination over arbitrary record stores
//! - Idempotent plaintext-to-ciphertext migration of marked fields
//! - Per-model runners with bounded-backoff retry and resume watermarks
//! - Sequential or concurrent orchestration across models
//! - Structured per-model reports with row-level counters
//!
//! ## Architecture
//!
//! Models come out of schema analysis; each eligible one is driven by its
//! own runner, which pages the table in cursor order and rewrites rows
//! through the cipher. Runners share nothing but the store and the cipher.
//!
//! ```text
//! ┌────────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ MigrationModel │────▶│ Orchestrator      │────▶│ ModelRunner  │
//! │ (from schema)  │     │ (filter, fan out) │     │ (per model)  │
//! └────────────────┘     └───────────────────┘     └──────┬───────┘
//!                                                         │
//!                                  ┌──────────────────────┤
//!                                  ▼                      ▼
//!                          ┌──────────────┐      ┌───────────────┐
//!                          │ CursorPager  │      │ FieldMigrator │
//!                          │ (keyset read)│      │ (classify +   │
//!                          └──────┬───────┘      │  encrypt row) │
//!                                 │              └───────┬───────┘
//!                                 ▼                      ▼
//!                          ┌─────────────────────────────────────┐
//!                          │             RecordStore             │
//!                          └─────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fieldcrypt_migrate::{
//!     EnvelopeCipher, MemoryStore, MigrationConfig, MigrationOrchestrator,
//! };
//! use fieldcrypt_schema::{CursorField, CursorKind, EncryptedField, MigrationModel};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::new());
//! store.insert_row("User", 1, [("email", Some("ada@example.com".to_string()))]);
//! store.insert_row("User", 2, [("email", None::<String>)]);
//!
//! let mut user = MigrationModel::new("User")
//!     .with_cursor(CursorField::new("id", CursorKind::Int));
//! user.add_field(EncryptedField::new("email"));
//!
//! let orchestrator = MigrationOrchestrator::new(
//!     store,
//!     Arc::new(EnvelopeCipher::new()),
//!     MigrationConfig::new(),
//! );
//! let report = orchestrator.run(&[user]).await;
//!
//! assert!(report.all_completed());
//! assert_eq!(report.get("User").map(|r| r.updated), Some(1));
//! # }
//! ```
//!
//! ## Retries and resume
//!
//! Transient store outages are retried with exponential backoff per
//! [`RetryPolicy`] and fail the model only once the retry budget is
//! exhausted; a write the store refuses for a single row counts that row
//! failed and the run keeps going. The report carries the last fully
//! migrated cursor as a watermark, and a later run can pick up from it with
//! [`ModelRunner::start_after`]. Because already-encrypted fields are
//! recognized and skipped, replaying rows is always safe.

pub mod cipher;
pub mod config;
pub mod cursor;
pub mod error;
pub mod memory;
pub mod migrator;
pub mod orchestrator;
pub mod pager;
pub mod report;
pub mod runner;
pub mod store;

// Re-exports
pub use tokio_util::sync::CancellationToken;

pub use cipher::{classify_field, CipherError, EnvelopeCipher, FieldCipher, FieldState};
pub use config::{MigrationConfig, RetryPolicy};
pub use cursor::CursorValue;
pub use error::{MigrateResult, MigrationError};
pub use memory::MemoryStore;
pub use migrator::{FieldFailure, FieldMigrator, RowDisposition, RowOutcome, RowPlan};
pub use orchestrator::MigrationOrchestrator;
pub use pager::{Batch, CursorPager};
pub use report::{MigrationReport, ModelReport, ModelStatus};
pub use runner::ModelRunner;
pub use store::{FieldChange, RecordRow, RecordStore};
