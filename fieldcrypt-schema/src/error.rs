//! Error types for schema-document analysis.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while reading or analyzing a schema document.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document could not be deserialized.
    #[error("invalid schema document: {message}")]
    InvalidDocument {
        /// What was wrong with the input.
        message: String,
    },

    /// The document contains no models at all.
    #[error("schema document contains no models")]
    EmptyDocument,

    /// Two models share the same name.
    #[error("duplicate model `{name}`")]
    DuplicateModel {
        /// The repeated model name.
        name: String,
    },

    /// A field is listed more than once within a model.
    #[error("duplicate field `{model}.{field}`")]
    DuplicateField {
        /// Owning model name.
        model: String,
        /// The repeated field name.
        field: String,
    },
}

impl SchemaError {
    /// Create an invalid-document error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDocument {
            message: err.to_string(),
        }
    }
}
