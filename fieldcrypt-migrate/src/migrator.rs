//! Per-row field migration.
//!
//! For each target field of a row, decide what the stored value is (via the
//! cipher probe) and stage the new value when one is needed. All staged
//! changes for a row are written back in a single update, so a write that
//! fails midway can never leave the row with some fields migrated and some
//! not. A row with any malformed field is never written at all: it is marked
//! failed, left for operator attention, and the batch moves on.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::warn;

use crate::cipher::{classify_field, FieldCipher, FieldState};
use crate::cursor::CursorValue;
use crate::error::MigrateResult;
use crate::store::{FieldChange, RecordRow, RecordStore};

/// How a row fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDisposition {
    /// At least one field was re-staged and the row was written.
    Updated,
    /// Every target field was NULL or already migrated; nothing written.
    Skipped,
    /// At least one field was malformed; nothing written.
    Failed,
}

/// The staged plan for one row, before any write.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPlan {
    /// New values to write, one entry per changed field.
    pub changes: Vec<FieldChange>,
    /// Fields that could not be migrated.
    pub failures: Vec<FieldFailure>,
    /// Fields left untouched (NULL or already ciphertext).
    pub skipped_fields: usize,
}

impl RowPlan {
    fn new() -> Self {
        Self {
            changes: Vec::new(),
            failures: Vec::new(),
            skipped_fields: 0,
        }
    }

    /// The row disposition this plan resolves to.
    pub fn disposition(&self) -> RowDisposition {
        if !self.failures.is_empty() {
            RowDisposition::Failed
        } else if !self.changes.is_empty() {
            RowDisposition::Updated
        } else {
            RowDisposition::Skipped
        }
    }
}

/// One field that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// Which field.
    pub field: SmolStr,
    /// What went wrong.
    pub message: String,
}

/// The finalized outcome of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    /// The row's cursor value.
    pub cursor: CursorValue,
    /// How the row fared.
    pub disposition: RowDisposition,
    /// Field-level failures, when the row failed.
    pub failures: Vec<FieldFailure>,
}

/// Computes and writes new field values for the rows of one table.
pub struct FieldMigrator<S, C> {
    store: Arc<S>,
    cipher: Arc<C>,
    table: SmolStr,
    cursor_field: SmolStr,
    reencrypt_existing: bool,
    dry_run: bool,
}

impl<S: RecordStore, C: FieldCipher> FieldMigrator<S, C> {
    /// Create a migrator for one table.
    pub fn new(
        store: Arc<S>,
        cipher: Arc<C>,
        table: impl Into<SmolStr>,
        cursor_field: impl Into<SmolStr>,
    ) -> Self {
        Self {
            store,
            cipher,
            table: table.into(),
            cursor_field: cursor_field.into(),
            reencrypt_existing: false,
            dry_run: false,
        }
    }

    /// Re-encrypt values that already decrypt cleanly (key/scheme rotation).
    pub fn reencrypt_existing(mut self, reencrypt: bool) -> Self {
        self.reencrypt_existing = reencrypt;
        self
    }

    /// Stage and classify without writing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stage the changes for one row without touching the store.
    pub fn plan_row(&self, row: &RecordRow, fields: &[SmolStr]) -> RowPlan {
        let mut plan = RowPlan::new();
        for field in fields {
            self.plan_field(field, row.value(field), &mut plan);
        }
        plan
    }

    fn plan_field(&self, field: &SmolStr, value: Option<&str>, plan: &mut RowPlan) {
        let Some(value) = value else {
            // NULL stays NULL.
            plan.skipped_fields += 1;
            return;
        };

        match classify_field(&*self.cipher, value) {
            FieldState::AlreadyCiphertext => {
                if self.reencrypt_existing {
                    self.plan_reencrypt(field, value, plan);
                } else {
                    plan.skipped_fields += 1;
                }
            }
            FieldState::Plaintext => match self.cipher.encrypt(value) {
                Ok(ciphertext) => plan.changes.push(FieldChange::new(field.clone(), ciphertext)),
                Err(err) => plan.failures.push(FieldFailure {
                    field: field.clone(),
                    message: err.to_string(),
                }),
            },
            FieldState::Malformed(message) => plan.failures.push(FieldFailure {
                field: field.clone(),
                message,
            }),
        }
    }

    fn plan_reencrypt(&self, field: &SmolStr, value: &str, plan: &mut RowPlan) {
        let rewrapped = self
            .cipher
            .decrypt(value)
            .and_then(|plaintext| self.cipher.encrypt(&plaintext));
        match rewrapped {
            Ok(ciphertext) => plan.changes.push(FieldChange::new(field.clone(), ciphertext)),
            Err(err) => plan.failures.push(FieldFailure {
                field: field.clone(),
                message: err.to_string(),
            }),
        }
    }

    /// Migrate one row: stage its changes and, when anything changed, write
    /// them back in a single update.
    ///
    /// Only store errors surface as `Err`; field problems land on the
    /// outcome and the caller keeps going.
    pub async fn migrate_row(
        &self,
        row: &RecordRow,
        fields: &[SmolStr],
    ) -> MigrateResult<RowOutcome> {
        let plan = self.plan_row(row, fields);
        let disposition = plan.disposition();

        for failure in &plan.failures {
            warn!(
                table = %self.table,
                cursor = %row.cursor,
                field = %failure.field,
                message = %failure.message,
                "field migration failed"
            );
        }

        if disposition == RowDisposition::Updated && !self.dry_run {
            self.store
                .update_row(&self.table, &self.cursor_field, &row.cursor, &plan.changes)
                .await?;
        }

        Ok(RowOutcome {
            cursor: row.cursor.clone(),
            disposition,
            failures: plan.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::EnvelopeCipher;
    use crate::memory::MemoryStore;
    use pretty_assertions::assert_eq;

    fn make_migrator() -> (Arc<MemoryStore>, FieldMigrator<MemoryStore, EnvelopeCipher>) {
        let store = Arc::new(MemoryStore::new());
        let migrator = FieldMigrator::new(
            Arc::clone(&store),
            Arc::new(EnvelopeCipher::new()),
            "User",
            "id",
        );
        (store, migrator)
    }

    fn target_fields() -> Vec<SmolStr> {
        vec!["email".into()]
    }

    // ==================== Plan Tests ====================

    #[test]
    fn test_plan_null_field_is_skipped() {
        let (_, migrator) = make_migrator();
        let row = RecordRow::new(1).with_value("email", None);

        let plan = migrator.plan_row(&row, &target_fields());
        assert_eq!(plan.disposition(), RowDisposition::Skipped);
        assert_eq!(plan.skipped_fields, 1);
        assert!(plan.changes.is_empty());
    }

    #[test]
    fn test_plan_plaintext_stages_encryption() {
        let (_, migrator) = make_migrator();
        let row = RecordRow::new(1).with_value("email", Some("alice@example.com".into()));

        let plan = migrator.plan_row(&row, &target_fields());
        assert_eq!(plan.disposition(), RowDisposition::Updated);
        assert_eq!(
            plan.changes,
            vec![FieldChange::new("email", "enc:v1:alice@example.com")]
        );
    }

    #[test]
    fn test_plan_already_ciphertext_is_skipped() {
        let (_, migrator) = make_migrator();
        let row = RecordRow::new(1).with_value("email", Some("enc:v1:alice@example.com".into()));

        let plan = migrator.plan_row(&row, &target_fields());
        assert_eq!(plan.disposition(), RowDisposition::Skipped);
        assert_eq!(plan.skipped_fields, 1);
    }

    #[test]
    fn test_plan_reencrypts_when_configured() {
        let (_, migrator) = make_migrator();
        let migrator = migrator.reencrypt_existing(true);
        let row = RecordRow::new(1).with_value("email", Some("enc:v1:alice@example.com".into()));

        let plan = migrator.plan_row(&row, &target_fields());
        assert_eq!(plan.disposition(), RowDisposition::Updated);
        assert_eq!(
            plan.changes,
            vec![FieldChange::new("email", "enc:v1:alice@example.com")]
        );
    }

    #[test]
    fn test_plan_malformed_fails_row() {
        let (_, migrator) = make_migrator();
        let row = RecordRow::new(77).with_value("email", Some("enc:v9:????".into()));

        let plan = migrator.plan_row(&row, &target_fields());
        assert_eq!(plan.disposition(), RowDisposition::Failed);
        assert_eq!(plan.failures.len(), 1);
        assert_eq!(plan.failures[0].field, "email");
    }

    #[test]
    fn test_plan_malformed_field_blocks_whole_row_write() {
        let (_, migrator) = make_migrator();
        let fields: Vec<SmolStr> = vec!["email".into(), "phone".into()];
        let row = RecordRow::new(1)
            .with_value("email", Some("alice@example.com".into()))
            .with_value("phone", Some("enc:v9:????".into()));

        let plan = migrator.plan_row(&row, &fields);
        // The plaintext field was staged, but the malformed one vetoes the write.
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.disposition(), RowDisposition::Failed);
    }

    #[test]
    fn test_plan_multiple_fields_single_row() {
        let (_, migrator) = make_migrator();
        let fields: Vec<SmolStr> = vec!["email".into(), "phone".into(), "notes".into()];
        let row = RecordRow::new(1)
            .with_value("email", Some("alice@example.com".into()))
            .with_value("phone", Some("enc:v1:555".into()))
            .with_value("notes", None);

        let plan = migrator.plan_row(&row, &fields);
        assert_eq!(plan.disposition(), RowDisposition::Updated);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.skipped_fields, 2);
    }

    // ==================== Write Tests ====================

    #[tokio::test]
    async fn test_migrate_row_writes_single_update() {
        let (store, migrator) = make_migrator();
        store.insert_row(
            "User",
            1,
            [
                ("email", Some("alice@example.com".to_string())),
                ("phone", Some("555".to_string())),
            ],
        );
        let fields: Vec<SmolStr> = vec!["email".into(), "phone".into()];
        let row = RecordRow::new(1)
            .with_value("email", Some("alice@example.com".into()))
            .with_value("phone", Some("555".into()));

        let outcome = migrator.migrate_row(&row, &fields).await.unwrap();

        assert_eq!(outcome.disposition, RowDisposition::Updated);
        assert_eq!(
            store.field_value("User", &CursorValue::Int(1), "email"),
            Some(Some("enc:v1:alice@example.com".to_string()))
        );
        assert_eq!(
            store.field_value("User", &CursorValue::Int(1), "phone"),
            Some(Some("enc:v1:555".to_string()))
        );
    }

    #[tokio::test]
    async fn test_migrate_row_failed_row_writes_nothing() {
        let (store, migrator) = make_migrator();
        store.insert_row(
            "User",
            1,
            [
                ("email", Some("alice@example.com".to_string())),
                ("phone", Some("enc:v9:????".to_string())),
            ],
        );
        let fields: Vec<SmolStr> = vec!["email".into(), "phone".into()];
        let row = RecordRow::new(1)
            .with_value("email", Some("alice@example.com".into()))
            .with_value("phone", Some("enc:v9:????".into()));

        let outcome = migrator.migrate_row(&row, &fields).await.unwrap();

        assert_eq!(outcome.disposition, RowDisposition::Failed);
        assert_eq!(
            store.field_value("User", &CursorValue::Int(1), "email"),
            Some(Some("alice@example.com".to_string())),
            "failed rows are left exactly as they were"
        );
    }

    #[tokio::test]
    async fn test_migrate_row_dry_run_writes_nothing() {
        let (store, migrator) = make_migrator();
        let migrator = migrator.dry_run(true);
        store.insert_row("User", 1, [("email", Some("alice@example.com".to_string()))]);
        let row = RecordRow::new(1).with_value("email", Some("alice@example.com".into()));

        let outcome = migrator.migrate_row(&row, &target_fields()).await.unwrap();

        assert_eq!(outcome.disposition, RowDisposition::Updated);
        assert_eq!(
            store.field_value("User", &CursorValue::Int(1), "email"),
            Some(Some("alice@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_migrate_row_store_error_propagates() {
        let (store, migrator) = make_migrator();
        store.insert_row("User", 1, [("email", Some("alice@example.com".to_string()))]);
        store.fail_next_updates(1);
        let row = RecordRow::new(1).with_value("email", Some("alice@example.com".into()));

        let err = migrator.migrate_row(&row, &target_fields()).await.unwrap_err();
        assert!(err.is_transient());
    }
}
