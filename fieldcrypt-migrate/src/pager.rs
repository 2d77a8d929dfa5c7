//! Keyset pagination over one table.
//!
//! The pager turns a table into an ordered, resumable sequence of row
//! batches. Each read asks the store for rows with cursor strictly greater
//! than the last watermark, so concurrent inserts and deletes elsewhere in
//! the table never shift which rows a later page returns. That property is
//! what makes migrating a live table safe without a table lock; offset
//! pagination cannot provide it.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use crate::cursor::CursorValue;
use crate::error::{MigrateResult, MigrationError};
use crate::store::{RecordRow, RecordStore};

/// One page of rows, with the watermark to resume after.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Rows in ascending cursor order.
    pub rows: Vec<RecordRow>,
    /// The maximum cursor value in this batch.
    pub watermark: CursorValue,
}

impl Batch {
    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Produces ordered, resumable batches of rows from one table.
pub struct CursorPager<S> {
    store: Arc<S>,
    table: SmolStr,
    cursor_field: SmolStr,
    fields: Vec<SmolStr>,
    batch_size: usize,
}

impl<S: RecordStore> CursorPager<S> {
    /// Create a pager over `table`, ordered by `cursor_field`, reading the
    /// given target fields.
    pub fn new(
        store: Arc<S>,
        table: impl Into<SmolStr>,
        cursor_field: impl Into<SmolStr>,
        fields: Vec<SmolStr>,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            cursor_field: cursor_field.into(),
            fields,
            batch_size: batch_size.max(1),
        }
    }

    /// Table this pager walks.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Fetch the next batch strictly above `after`; `None` means the table
    /// is exhausted.
    ///
    /// Store errors are propagated uninterpreted; the retry decision belongs
    /// to the caller. Rows that violate ascending strictly-greater-than
    /// order are a store bug and surface as
    /// [`MigrationError::CursorOrder`].
    pub async fn next_batch(
        &self,
        after: Option<&CursorValue>,
    ) -> MigrateResult<Option<Batch>> {
        let rows = self
            .store
            .read_batch(
                &self.table,
                &self.cursor_field,
                after,
                &self.fields,
                self.batch_size,
            )
            .await?;

        if rows.is_empty() {
            debug!(table = %self.table, "pagination exhausted");
            return Ok(None);
        }

        let watermark = self.check_order(&rows, after)?;
        debug!(
            table = %self.table,
            rows = rows.len(),
            watermark = %watermark,
            "fetched batch"
        );
        Ok(Some(Batch { rows, watermark }))
    }

    /// Verify ascending, strictly-above-`after` order and return the batch
    /// watermark (its maximum cursor).
    fn check_order(
        &self,
        rows: &[RecordRow],
        after: Option<&CursorValue>,
    ) -> MigrateResult<CursorValue> {
        let mut previous = after.cloned();
        for row in rows {
            if let Some(prev) = &previous {
                if row.cursor <= *prev {
                    return Err(MigrationError::cursor_order(
                        self.table.as_str(),
                        format!("cursor {} not above {}", row.cursor, prev),
                    ));
                }
            }
            previous = Some(row.cursor.clone());
        }
        // Loop ran at least once; rows is non-empty.
        previous.ok_or_else(|| MigrationError::store("empty batch has no watermark"))
    }
}
