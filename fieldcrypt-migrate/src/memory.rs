//! In-memory record store.
//!
//! A [`RecordStore`] over process-local tables, used by the test suite and
//! by callers who want to rehearse a migration without a database. Supports
//! an injectable fault plan so retry handling can be exercised
//! deterministically.

use std::collections::BTreeMap;
use std::ops::Bound;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use smol_str::SmolStr;

use crate::cursor::CursorValue;
use crate::error::{MigrateResult, MigrationError};
use crate::store::{FieldChange, RecordRow, RecordStore};

type Row = IndexMap<SmolStr, Option<String>>;
type Table = BTreeMap<CursorValue, Row>;

/// An in-memory [`RecordStore`] with fault injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<IndexMap<SmolStr, Table>>,
    fail_reads: Mutex<u32>,
    fail_updates: Mutex<u32>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a row. Field values of `None` are NULL.
    pub fn insert_row<F>(
        &self,
        table: &str,
        cursor: impl Into<CursorValue>,
        values: impl IntoIterator<Item = (F, Option<String>)>,
    ) where
        F: Into<SmolStr>,
    {
        let row: Row = values
            .into_iter()
            .map(|(field, value)| (field.into(), value))
            .collect();
        self.tables
            .write()
            .entry(table.into())
            .or_default()
            .insert(cursor.into(), row);
    }

    /// Remove a row, as a concurrent writer might. Returns whether it
    /// existed.
    pub fn remove_row(&self, table: &str, cursor: &CursorValue) -> bool {
        self.tables
            .write()
            .get_mut(table)
            .and_then(|t| t.remove(cursor))
            .is_some()
    }

    /// The stored value of one field: `None` if the row does not exist,
    /// `Some(None)` for NULL.
    pub fn field_value(
        &self,
        table: &str,
        cursor: &CursorValue,
        field: &str,
    ) -> Option<Option<String>> {
        self.tables
            .read()
            .get(table)?
            .get(cursor)?
            .get(field)
            .cloned()
    }

    /// Number of rows in a table (0 when absent).
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Table::len)
    }

    /// All values of one field across a table, in cursor order.
    pub fn column(&self, table: &str, field: &str) -> Vec<Option<String>> {
        self.tables.read().get(table).map_or_else(Vec::new, |t| {
            t.values()
                .map(|row| row.get(field).cloned().unwrap_or(None))
                .collect()
        })
    }

    /// Fail the next `n` reads with a transient store error.
    pub fn fail_next_reads(&self, n: u32) {
        *self.fail_reads.lock() = n;
    }

    /// Fail the next `n` updates with a transient store error.
    pub fn fail_next_updates(&self, n: u32) {
        *self.fail_updates.lock() = n;
    }

    fn take_fault(counter: &Mutex<u32>) -> bool {
        let mut remaining = counter.lock();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn read_batch(
        &self,
        table: &str,
        _cursor_field: &str,
        after: Option<&CursorValue>,
        fields: &[SmolStr],
        limit: usize,
    ) -> MigrateResult<Vec<RecordRow>> {
        if Self::take_fault(&self.fail_reads) {
            return Err(MigrationError::unavailable("injected read outage"));
        }

        let tables = self.tables.read();
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let range: Box<dyn Iterator<Item = (&CursorValue, &Row)>> = match after {
            Some(cursor) => Box::new(rows.range((Bound::Excluded(cursor), Bound::Unbounded))),
            None => Box::new(rows.iter()),
        };

        Ok(range
            .take(limit)
            .map(|(cursor, row)| RecordRow {
                cursor: cursor.clone(),
                values: fields
                    .iter()
                    .map(|f| (f.clone(), row.get(f).cloned().unwrap_or(None)))
                    .collect(),
            })
            .collect())
    }

    async fn update_row(
        &self,
        table: &str,
        _cursor_field: &str,
        cursor: &CursorValue,
        changes: &[FieldChange],
    ) -> MigrateResult<()> {
        if Self::take_fault(&self.fail_updates) {
            return Err(MigrationError::unavailable("injected update outage"));
        }

        let mut tables = self.tables.write();
        let row = tables
            .get_mut(table)
            .and_then(|t| t.get_mut(cursor))
            .ok_or_else(|| {
                MigrationError::store(format!("row {} not found in `{}`", cursor, table))
            })?;

        for change in changes {
            row.insert(change.field.clone(), Some(change.value.clone()));
        }
        Ok(())
    }
}
