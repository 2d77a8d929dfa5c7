//! Migration-facing model descriptions.
//!
//! These are the distilled facts the migration engine needs about a table:
//! which fields to encrypt and which field paginates it. They are produced by
//! [`crate::analyze::analyze`] from a [`crate::document::SchemaDocument`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A table eligible (or candidate) for field-encryption migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationModel {
    /// Model name (also the table name).
    pub name: SmolStr,
    /// Fields to encrypt, keyed by field name, in declaration order.
    pub fields: IndexMap<SmolStr, EncryptedField>,
    /// The pagination cursor, when the model has a usable one.
    pub cursor: Option<CursorField>,
}

impl MigrationModel {
    /// Create a model with no encrypted fields and no cursor.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            cursor: None,
        }
    }

    /// Add an encrypted field.
    pub fn add_field(&mut self, field: EncryptedField) {
        self.fields.insert(field.name.clone(), field);
    }

    /// Set the cursor field.
    pub fn with_cursor(mut self, cursor: CursorField) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Names of the fields to encrypt, in declaration order.
    pub fn field_names(&self) -> Vec<SmolStr> {
        self.fields.keys().cloned().collect()
    }

    /// A model is eligible when it has at least one encrypted field and a
    /// cursor to paginate by. Decided once, before any migration starts.
    pub fn is_eligible(&self) -> bool {
        !self.fields.is_empty() && self.cursor.is_some()
    }
}

/// A column marked for encryption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedField {
    /// Field name, unique within the model.
    pub name: SmolStr,
    /// Raw annotation text after the marker, if the schema carried any
    /// (e.g. `mode=strict`). Interpreted by the cipher layer, not here.
    pub annotation: Option<String>,
}

impl EncryptedField {
    /// Create a field with no annotation parameters.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
        }
    }

    /// Attach annotation parameters.
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }
}

/// The field a model is paginated by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorField {
    /// Field name.
    pub name: SmolStr,
    /// How cursor values travel over the store seam.
    pub kind: CursorKind,
}

impl CursorField {
    /// Create a cursor field.
    pub fn new(name: impl Into<SmolStr>, kind: CursorKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Wire representation of a cursor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorKind {
    /// Integer cursor (`Int`, `BigInt`).
    Int,
    /// Text cursor (`String`, and `DateTime` as sortable ISO-8601 text).
    Text,
}
