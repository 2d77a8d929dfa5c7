//! # fieldcrypt-schema
//!
//! Schema-document analysis for fieldcrypt encryption migrations.
//!
//! This crate consumes the JSON schema document produced by an upstream
//! metadata reader and answers one question per model: does it qualify for a
//! field-encryption migration, and if so over which fields and which cursor?
//!
//! ## Example
//!
//! ```rust
//! use fieldcrypt_schema::{analyze, SchemaDocument};
//!
//! let document = SchemaDocument::from_json(r#"{
//!     "models": [{
//!         "name": "User",
//!         "fields": [
//!             { "name": "id", "type": "Int", "isId": true },
//!             { "name": "email", "type": "String", "documentation": "@encrypted" }
//!         ]
//!     }]
//! }"#)?;
//!
//! let analysis = analyze(&document)?;
//! assert_eq!(analysis.eligible_names(), vec!["User"]);
//! # Ok::<(), fieldcrypt_schema::SchemaError>(())
//! ```

pub mod analyze;
pub mod document;
pub mod error;
pub mod model;

pub use analyze::{analyze, SchemaAnalysis, SkipReason, SkippedModel};
pub use document::{DocumentField, DocumentModel, ScalarType, SchemaDocument};
pub use error::{SchemaError, SchemaResult};
pub use model::{CursorField, CursorKind, EncryptedField, MigrationModel};
