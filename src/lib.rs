//! # Fieldcrypt
//!
//! Batched, cursor-paginated field-level encryption migrations for
//! relational tables.
//!
//! Fieldcrypt provides:
//! - Schema-document analysis that finds fields marked for encryption
//! - Keyset pagination that walks tables in stable cursor order
//! - Idempotent migration of plaintext values into ciphertext envelopes
//! - Per-model runners with retry, resume watermarks, and cancellation
//! - Sequential or concurrent orchestration with structured reports
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fieldcrypt::migrate::{
//!     EnvelopeCipher, MemoryStore, MigrationConfig, MigrationOrchestrator,
//! };
//! use fieldcrypt::schema::{self, SchemaDocument};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Models come from a schema document; `@encrypted` marks the fields.
//! let document = SchemaDocument::from_json(
//!     r#"{
//!         "models": [{
//!             "name": "User",
//!             "fields": [
//!                 {"name": "id", "type": "Int", "isId": true},
//!                 {"name": "email", "type": "String", "documentation": "@encrypted"}
//!             ]
//!         }]
//!     }"#,
//! )?;
//! let analysis = schema::analyze(&document)?;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.insert_row("User", 1, [("email", Some("ada@example.com".to_string()))]);
//!
//! let orchestrator = MigrationOrchestrator::new(
//!     store,
//!     Arc::new(EnvelopeCipher::new()),
//!     MigrationConfig::new(),
//! );
//! let report = orchestrator.run(&analysis.eligible).await;
//!
//! assert!(report.all_completed());
//! # Ok(())
//! # }
//! ```
//!
//! Stores are pluggable through the
//! [`RecordStore`](migrate::RecordStore) trait; `fieldcrypt-sqlite` ships a
//! SQLite implementation (also re-exported here as the `sqlite` module when
//! the `sqlite` feature is enabled), and the in-memory store above backs
//! tests.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema-document analysis: encrypted-field markers and cursor selection.
pub mod schema {
    pub use fieldcrypt_schema::*;
}

/// The migration engine: pagination, classification, runners, and reports.
pub mod migrate {
    pub use fieldcrypt_migrate::*;
}

/// SQLite-backed record store, available with the `sqlite` feature.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use fieldcrypt_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        CancellationToken, CursorValue, EnvelopeCipher, FieldCipher, MemoryStore, MigrationConfig,
        MigrationOrchestrator, MigrationReport, ModelReport, ModelRunner, ModelStatus, RecordStore,
        RetryPolicy,
    };
    pub use crate::schema::{analyze, MigrationModel, SchemaAnalysis, SchemaDocument};
}

// Re-export key types at the crate root
pub use migrate::{MigrationConfig, MigrationOrchestrator, MigrationReport};
pub use schema::{SchemaDocument, SchemaError};
