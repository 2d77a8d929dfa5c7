//! Serialized schema-document input.
//!
//! The upstream metadata reader hands over a JSON document describing every
//! model and field in the data source. This module deserializes that document
//! and exposes the per-field facts the analyzer needs: scalar type, identity
//! and uniqueness markers, and the `@encrypted` annotation carried in the
//! field's documentation string.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::SchemaResult;

/// The whole schema document: an ordered list of models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Models in declaration order.
    pub models: Vec<DocumentModel>,
}

impl SchemaDocument {
    /// Deserialize a document from a JSON string.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Deserialize a document from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> SchemaResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// One model (table) description from the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentModel {
    /// Model name, unique within the document.
    pub name: SmolStr,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<DocumentField>,
    /// Documentation comment attached to the model, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl DocumentModel {
    /// Create an empty model description.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
            documentation: None,
        }
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&DocumentField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One field (column) description from the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentField {
    /// Field name, unique within the model.
    pub name: SmolStr,
    /// Scalar type name as declared (`Int`, `String`, `DateTime`, ...).
    #[serde(rename = "type")]
    pub field_type: SmolStr,
    /// Whether this field is the model's primary identifier.
    #[serde(default)]
    pub is_id: bool,
    /// Whether this field carries a unique constraint.
    #[serde(default)]
    pub is_unique: bool,
    /// Whether this field is a list (array) type.
    #[serde(default)]
    pub is_list: bool,
    /// Documentation comment attached to the field, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl DocumentField {
    /// Create a field description with the given name and type.
    pub fn new(name: impl Into<SmolStr>, field_type: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            is_id: false,
            is_unique: false,
            is_list: false,
            documentation: None,
        }
    }

    /// Set the documentation comment.
    pub fn with_documentation(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    /// Mark this field as the primary identifier.
    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    /// Mark this field as unique.
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// The scalar type of this field, if it is a known scalar.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        ScalarType::parse(&self.field_type)
    }

    /// Whether the field's documentation carries the `@encrypted` annotation.
    ///
    /// Both the bare marker and the parameterized form (`@encrypted?mode=...`)
    /// are recognized; parameters are left to the cipher layer.
    pub fn is_encrypted(&self) -> bool {
        let Some(doc) = &self.documentation else {
            return false;
        };
        doc.split_whitespace()
            .any(|token| token == "@encrypted" || token.starts_with("@encrypted?"))
    }
}

/// Known scalar field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// Text.
    String,
    /// Timestamp, serialized as sortable ISO-8601 text.
    DateTime,
    /// Boolean.
    Boolean,
    /// Double-precision float.
    Float,
    /// Arbitrary-precision decimal.
    Decimal,
    /// JSON value.
    Json,
    /// Raw bytes.
    Bytes,
}

impl ScalarType {
    /// Parse a scalar type from its document name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Int" => Some(Self::Int),
            "BigInt" => Some(Self::BigInt),
            "String" => Some(Self::String),
            "DateTime" => Some(Self::DateTime),
            "Boolean" => Some(Self::Boolean),
            "Float" => Some(Self::Float),
            "Decimal" => Some(Self::Decimal),
            "Json" => Some(Self::Json),
            "Bytes" => Some(Self::Bytes),
            _ => None,
        }
    }

    /// Whether values of this type form a strict total order usable as a
    /// pagination cursor.
    pub fn is_sortable(&self) -> bool {
        matches!(
            self,
            Self::Int | Self::BigInt | Self::String | Self::DateTime
        )
    }

    /// Whether cursor values of this type travel as integers (as opposed to
    /// text).
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt)
    }
}
