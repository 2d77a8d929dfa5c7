//! SQLite-backed record store.
//!
//! One [`tokio_rusqlite::Connection`], which serializes all statements onto
//! a dedicated thread. Batch reads are driven by the cursor column alone
//! (`WHERE cursor > ? ORDER BY cursor ASC LIMIT ?`), so rows inserted behind
//! the watermark while a migration runs are never revisited and never shift
//! later pages the way offset pagination would.

use async_trait::async_trait;
use rusqlite::types::{Value, ValueRef};
use smol_str::SmolStr;
use tokio_rusqlite::Connection;
use tracing::debug;

use fieldcrypt_migrate::{CursorValue, FieldChange, MigrateResult, RecordRow, RecordStore};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};

/// Quote an identifier for safe inclusion in SQL.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cursor_to_sql(cursor: &CursorValue) -> Value {
    match cursor {
        CursorValue::Int(n) => Value::Integer(*n),
        CursorValue::Text(s) => Value::Text(s.clone()),
    }
}

/// A record store over one SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database and apply the configured pragmas.
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory().await?,
            DatabasePath::File(path) => Connection::open(path).await?,
        };

        let init = config.init_sql();
        if !init.is_empty() {
            conn.call(move |conn| Ok(conn.execute_batch(&init)?)).await?;
        }

        debug!(path = config.path.as_str(), "opened sqlite store");
        Ok(Self { conn })
    }

    /// Execute multiple statements in a batch. Intended for table setup and
    /// seed data around a migration run.
    pub async fn execute_batch(&self, sql: impl Into<String>) -> SqliteResult<()> {
        let sql = sql.into();
        self.conn
            .call(move |conn| Ok(conn.execute_batch(&sql)?))
            .await
            .map_err(SqliteError::from)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn read_batch(
        &self,
        table: &str,
        cursor_field: &str,
        after: Option<&CursorValue>,
        fields: &[SmolStr],
        limit: usize,
    ) -> MigrateResult<Vec<RecordRow>> {
        let quoted_cursor = quote_identifier(cursor_field);
        let mut columns = vec![quoted_cursor.clone()];
        columns.extend(fields.iter().map(|f| quote_identifier(f)));

        let sql = match after {
            Some(_) => format!(
                "SELECT {} FROM {} WHERE {} > ? ORDER BY {} ASC LIMIT ?",
                columns.join(", "),
                quote_identifier(table),
                quoted_cursor,
                quoted_cursor,
            ),
            None => format!(
                "SELECT {} FROM {} ORDER BY {} ASC LIMIT ?",
                columns.join(", "),
                quote_identifier(table),
                quoted_cursor,
            ),
        };

        let mut params: Vec<Value> = Vec::with_capacity(2);
        if let Some(cursor) = after {
            params.push(cursor_to_sql(cursor));
        }
        params.push(Value::Integer(limit as i64));
        let field_names: Vec<SmolStr> = fields.to_vec();

        debug!(table = %table, sql = %sql, "reading batch");
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let params_ref: Vec<&dyn rusqlite::ToSql> =
                    params.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

                let mapped = stmt.query_map(params_ref.as_slice(), |row| {
                    let cursor = match row.get_ref(0)? {
                        ValueRef::Integer(n) => CursorValue::Int(n),
                        ValueRef::Text(_) => CursorValue::Text(row.get(0)?),
                        other => {
                            return Err(rusqlite::Error::InvalidColumnType(
                                0,
                                "cursor".to_string(),
                                other.data_type(),
                            ));
                        }
                    };
                    let mut record = RecordRow::new(cursor);
                    for (i, name) in field_names.iter().enumerate() {
                        let value: Option<String> = row.get(i + 1)?;
                        record.values.insert(name.clone(), value);
                    }
                    Ok(record)
                })?;

                let collected: Result<Vec<_>, _> = mapped.collect();
                Ok(collected?)
            })
            .await
            .map_err(SqliteError::from)?;

        Ok(rows)
    }

    async fn update_row(
        &self,
        table: &str,
        cursor_field: &str,
        cursor: &CursorValue,
        changes: &[FieldChange],
    ) -> MigrateResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = changes
            .iter()
            .map(|c| format!("{} = ?", quote_identifier(&c.field)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_identifier(table),
            assignments.join(", "),
            quote_identifier(cursor_field),
        );

        let mut params: Vec<Value> = changes
            .iter()
            .map(|c| Value::Text(c.value.clone()))
            .collect();
        params.push(cursor_to_sql(cursor));

        debug!(table = %table, cursor = %cursor, fields = changes.len(), "updating row");
        let affected = self
            .conn
            .call(move |conn| {
                let params_ref: Vec<&dyn rusqlite::ToSql> =
                    params.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
                Ok(conn.execute(&sql, params_ref.as_slice())?)
            })
            .await
            .map_err(SqliteError::from)?;

        if affected == 0 {
            return Err(SqliteError::query(format!(
                "row `{}` disappeared from `{}` mid-migration",
                cursor, table
            ))
            .into());
        }
        Ok(())
    }
}
