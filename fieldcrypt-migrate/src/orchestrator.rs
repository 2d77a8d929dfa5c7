//! Runs the migration across every eligible model.
//!
//! The orchestrator owns nothing per-row; it filters out models that cannot
//! be migrated, hands each remaining model to its own [`ModelRunner`], and
//! collects the per-model reports into one [`MigrationReport`]. Runners never
//! share mutable state, so the concurrent mode needs no locking beyond what
//! the store itself does. Reports land in the result map in declaration
//! order either way.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fieldcrypt_schema::MigrationModel;

use crate::cipher::FieldCipher;
use crate::config::MigrationConfig;
use crate::error::MigrationError;
use crate::report::{MigrationReport, ModelReport, ModelStatus};
use crate::runner::ModelRunner;
use crate::store::RecordStore;

/// Coordinates one migration run over a set of models.
pub struct MigrationOrchestrator<S, C> {
    store: Arc<S>,
    cipher: Arc<C>,
    config: MigrationConfig,
    cancel: CancellationToken,
}

impl<S, C> MigrationOrchestrator<S, C>
where
    S: RecordStore + 'static,
    C: FieldCipher + 'static,
{
    /// Create an orchestrator over one store and one cipher.
    pub fn new(store: Arc<S>, cipher: Arc<C>, config: MigrationConfig) -> Self {
        Self {
            store,
            cipher,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use the given token to cancel the whole run. Every runner checks it
    /// between batches.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Migrate every eligible model and report on each one.
    ///
    /// Ineligible models (no encrypted fields, or no usable cursor) are
    /// filtered out before anything starts and never appear in the report.
    /// Every model that starts gets an entry, whatever its outcome.
    pub async fn run(&self, models: &[MigrationModel]) -> MigrationReport {
        let started = Instant::now();

        let eligible: Vec<&MigrationModel> = models
            .iter()
            .filter(|model| {
                if model.is_eligible() {
                    true
                } else {
                    debug!(model = %model.name, "skipping ineligible model");
                    false
                }
            })
            .collect();

        info!(
            models = eligible.len(),
            concurrently = self.config.concurrently,
            "starting migration run"
        );

        let mut report = MigrationReport::new();
        if self.config.concurrently {
            self.run_concurrently(&eligible, &mut report).await;
        } else {
            for model in eligible {
                report.insert(self.runner_for(model).run().await);
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            models = report.len(),
            scanned = report.total_scanned(),
            updated = report.total_updated(),
            failed = report.total_failed(),
            duration_ms = report.duration_ms,
            "migration run finished"
        );
        report
    }

    /// One task per model; results are collected in declaration order, so
    /// the report reads the same as a sequential run.
    async fn run_concurrently(&self, eligible: &[&MigrationModel], report: &mut MigrationReport) {
        let mut handles = Vec::with_capacity(eligible.len());
        for model in eligible {
            let name = model.name.clone();
            let handle = tokio::spawn(self.runner_for(model).run());
            handles.push((name, handle));
        }

        for (name, handle) in handles {
            match handle.await {
                Ok(model_report) => report.insert(model_report),
                Err(join_err) => {
                    warn!(model = %name, error = %join_err, "worker task failed");
                    let err = MigrationError::WorkerFailed(name.to_string());
                    let mut failed = ModelReport::new(name);
                    failed.status = ModelStatus::Failed(err.to_string());
                    report.insert(failed);
                }
            }
        }
    }

    fn runner_for(&self, model: &MigrationModel) -> ModelRunner<S, C> {
        ModelRunner::new(
            model.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.cipher),
            self.config.clone(),
        )
        .with_cancellation(self.cancel.clone())
    }
}
