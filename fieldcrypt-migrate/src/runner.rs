//! Drives one model's migration to completion.
//!
//! Lifecycle: a runner is idle from construction until [`ModelRunner::run`]
//! is called, running while it loops over batches, and terminal once `run`
//! returns. The report is owned by the runner alone until it is returned
//! frozen, so concurrent runners never share mutable state.
//!
//! The loop: fetch the next batch above the watermark, migrate every row in
//! it, then advance the watermark to the batch's maximum cursor, even when
//! rows in the batch failed. A single bad row never blocks forward progress:
//! a write the store refuses, such as a row a concurrent writer deleted
//! between read and update, counts that row failed and the batch keeps
//! going. Only a store outage that survives the whole retry budget ends the
//! run early. Cancellation is honored between batches, never mid-batch, and
//! the watermark reached so far is preserved for resume.

use std::sync::Arc;
use std::time::Instant;

use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fieldcrypt_schema::MigrationModel;

use crate::cipher::FieldCipher;
use crate::config::MigrationConfig;
use crate::cursor::CursorValue;
use crate::error::MigrateResult;
use crate::migrator::{FieldMigrator, RowDisposition, RowOutcome};
use crate::pager::{Batch, CursorPager};
use crate::report::{ModelReport, ModelStatus};
use crate::store::{RecordRow, RecordStore};

/// Migrates one model's table, batch by batch.
pub struct ModelRunner<S, C> {
    model: MigrationModel,
    store: Arc<S>,
    cipher: Arc<C>,
    config: MigrationConfig,
    cancel: CancellationToken,
    start_after: Option<CursorValue>,
}

impl<S: RecordStore, C: FieldCipher> ModelRunner<S, C> {
    /// Create a runner for one model.
    pub fn new(
        model: MigrationModel,
        store: Arc<S>,
        cipher: Arc<C>,
        config: MigrationConfig,
    ) -> Self {
        Self {
            model,
            store,
            cipher,
            config,
            cancel: CancellationToken::new(),
            start_after: None,
        }
    }

    /// Use the given token for between-batch cancellation checks.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resume from a previous run's watermark: only rows with a strictly
    /// greater cursor are visited.
    pub fn start_after(mut self, watermark: CursorValue) -> Self {
        self.start_after = Some(watermark);
        self
    }

    /// Run the migration to a terminal state. Never returns an error; store
    /// failure after exhausted retries lands in the report as `Failed`.
    pub async fn run(self) -> ModelReport {
        let started = Instant::now();
        let mut report = ModelReport::new(self.model.name.clone());
        report.watermark = self.start_after.clone();

        let Some(cursor_field) = self.model.cursor.as_ref().map(|c| c.name.clone()) else {
            report.status =
                ModelStatus::Failed(format!("model `{}` has no cursor field", self.model.name));
            return report;
        };
        let fields = self.model.field_names();
        if fields.is_empty() {
            report.status = ModelStatus::Failed(format!(
                "model `{}` has no fields to migrate",
                self.model.name
            ));
            return report;
        }

        let pager = CursorPager::new(
            Arc::clone(&self.store),
            self.model.name.clone(),
            cursor_field.clone(),
            fields.clone(),
            self.config.batch_size,
        );
        let migrator = FieldMigrator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.cipher),
            self.model.name.clone(),
            cursor_field,
        )
        .reencrypt_existing(self.config.reencrypt_existing)
        .dry_run(self.config.dry_run);

        let mut watermark = self.start_after.clone();
        report.status = 'run: loop {
            if self.cancel.is_cancelled() {
                info!(model = %self.model.name, watermark = ?watermark, "run cancelled");
                break 'run ModelStatus::Canceled;
            }

            let batch = match self.fetch_with_retry(&pager, watermark.as_ref()).await {
                Ok(Some(batch)) => batch,
                Ok(None) => break 'run ModelStatus::Completed,
                Err(err) => break 'run ModelStatus::Failed(err.to_string()),
            };

            for row in &batch.rows {
                match self.migrate_with_retry(&migrator, row, &fields).await {
                    Ok(outcome) => Self::record(&mut report, &outcome),
                    Err(err) if err.is_transient() => {
                        break 'run ModelStatus::Failed(err.to_string());
                    }
                    Err(err) => {
                        // A write the store refused outright is scoped to this
                        // row; the rest of the batch still migrates.
                        warn!(
                            model = %self.model.name,
                            cursor = %row.cursor,
                            error = %err,
                            "row update failed; row marked failed"
                        );
                        report.scanned += 1;
                        report.failed += 1;
                    }
                }
            }

            debug!(
                model = %self.model.name,
                rows = batch.len(),
                watermark = %batch.watermark,
                "batch migrated"
            );
            watermark = Some(batch.watermark);
            report.watermark = watermark.clone();
        };

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            model = %self.model.name,
            status = %report.status.label(),
            summary = %report.summary(),
            "model migration finished"
        );
        report
    }

    fn record(report: &mut ModelReport, outcome: &RowOutcome) {
        report.scanned += 1;
        match outcome.disposition {
            RowDisposition::Updated => report.updated += 1,
            RowDisposition::Skipped => report.skipped += 1,
            RowDisposition::Failed => report.failed += 1,
        }
    }

    /// Fetch the next batch, retrying transient store failures with bounded
    /// exponential backoff.
    async fn fetch_with_retry(
        &self,
        pager: &CursorPager<S>,
        after: Option<&CursorValue>,
    ) -> MigrateResult<Option<Batch>> {
        let policy = &self.config.retry;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match pager.next_batch(after).await {
                Ok(batch) => return Ok(batch),
                Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        model = %self.model.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "batch read failed; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Migrate one row, retrying transient store failures on its write.
    async fn migrate_with_retry(
        &self,
        migrator: &FieldMigrator<S, C>,
        row: &RecordRow,
        fields: &[SmolStr],
    ) -> MigrateResult<RowOutcome> {
        let policy = &self.config.retry;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match migrator.migrate_row(row, fields).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        model = %self.model.name,
                        cursor = %row.cursor,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "row update failed; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
