//! The storage seam.
//!
//! The engine needs exactly two operations from a store: an ordered range
//! read by cursor (strictly greater than, ascending, limited) and a
//! single-row update covering a set of fields. Everything else, such as
//! pooling and transaction scope, belongs to the implementation behind the
//! trait.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::cursor::CursorValue;
use crate::error::MigrateResult;

/// One row as read from the store: its cursor value plus the current values
/// of the requested target fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRow {
    /// This row's pagination key.
    pub cursor: CursorValue,
    /// Target-field values; `None` is SQL NULL.
    pub values: IndexMap<SmolStr, Option<String>>,
}

impl RecordRow {
    /// Create a row with no field values.
    pub fn new(cursor: impl Into<CursorValue>) -> Self {
        Self {
            cursor: cursor.into(),
            values: IndexMap::new(),
        }
    }

    /// Add a field value.
    pub fn with_value(mut self, field: impl Into<SmolStr>, value: Option<String>) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    /// The stored value of a field; `None` for NULL or for fields the read
    /// did not cover.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|v| v.as_deref())
    }
}

/// A staged new value for one field of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Field to update.
    pub field: SmolStr,
    /// New value.
    pub value: String,
}

impl FieldChange {
    /// Create a field change.
    pub fn new(field: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Ordered reads and row updates against one relational store.
///
/// Contract for `read_batch`: rows whose cursor value is strictly greater
/// than `after` (all rows when `after` is `None`), ordered ascending by the
/// cursor field, at most `limit` of them. Offset pagination is not an
/// acceptable implementation; the cursor is the sole ordering key.
///
/// Transient connectivity failures must surface as
/// [`MigrationError::StoreUnavailable`](crate::error::MigrationError::StoreUnavailable)
/// so the runner can retry them.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the next batch of rows above `after`.
    async fn read_batch(
        &self,
        table: &str,
        cursor_field: &str,
        after: Option<&CursorValue>,
        fields: &[SmolStr],
        limit: usize,
    ) -> MigrateResult<Vec<RecordRow>>;

    /// Apply all staged changes for one row in a single update.
    async fn update_row(
        &self,
        table: &str,
        cursor_field: &str,
        cursor: &CursorValue,
        changes: &[FieldChange],
    ) -> MigrateResult<()>;
}
