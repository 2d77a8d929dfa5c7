//! Per-model and aggregate migration reports.
//!
//! A model's report is created when its runner starts, owned and mutated by
//! that runner alone, and frozen when the runner reaches a terminal state.
//! The aggregate report preserves model declaration order and drives the
//! caller's success/failure decision.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::cursor::CursorValue;

/// Terminal state of one model's migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStatus {
    /// The pager reported the end of the table.
    Completed,
    /// Store failure after exhausted retries, with the reason.
    Failed(String),
    /// Cancelled between batches; the watermark is preserved for resume.
    Canceled,
}

impl ModelStatus {
    /// Whether this model finished its whole table.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Short label without the failure reason.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Failed(_) => "Failed",
            Self::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "Failed: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}

/// Result of one model's migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    /// Model name.
    pub model: SmolStr,
    /// Rows visited.
    pub scanned: u64,
    /// Rows written with new field values.
    pub updated: u64,
    /// Rows needing no change (NULL or already migrated fields).
    pub skipped: u64,
    /// Rows with at least one malformed field.
    pub failed: u64,
    /// Terminal state.
    pub status: ModelStatus,
    /// Highest cursor value successfully processed, for resume.
    pub watermark: Option<CursorValue>,
    /// Wall-clock duration of the model's run in milliseconds.
    pub duration_ms: u64,
}

impl ModelReport {
    /// Create a fresh report for a starting runner.
    pub fn new(model: impl Into<SmolStr>) -> Self {
        Self {
            model: model.into(),
            scanned: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            status: ModelStatus::Completed,
            watermark: None,
            duration_ms: 0,
        }
    }

    /// One-line count summary, e.g. `250 scanned, 150 updated, 100 skipped`.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} scanned", self.scanned)];
        if self.updated > 0 {
            parts.push(format!("{} updated", self.updated));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        parts.join(", ")
    }
}

/// Aggregate result of a whole run, in model declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Per-model reports keyed by model name.
    pub models: IndexMap<SmolStr, ModelReport>,
    /// Wall-clock duration of the whole run in milliseconds.
    pub duration_ms: u64,
}

impl MigrationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one model's report, keyed by its name.
    pub fn insert(&mut self, report: ModelReport) {
        self.models.insert(report.model.clone(), report);
    }

    /// Get one model's report.
    pub fn get(&self, model: &str) -> Option<&ModelReport> {
        self.models.get(model)
    }

    /// Number of models in the report.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model ran.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The run succeeded only if every model completed.
    pub fn all_completed(&self) -> bool {
        self.models.values().all(|r| r.status.is_completed())
    }

    /// Process exit code for the caller: 0 on full success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_completed() { 0 } else { 1 }
    }

    /// Total rows visited across all models.
    pub fn total_scanned(&self) -> u64 {
        self.models.values().map(|r| r.scanned).sum()
    }

    /// Total rows updated across all models.
    pub fn total_updated(&self) -> u64 {
        self.models.values().map(|r| r.updated).sum()
    }

    /// Total rows failed across all models.
    pub fn total_failed(&self) -> u64 {
        self.models.values().map(|r| r.failed).sum()
    }

    /// Render an aligned console table, model names padded to the longest
    /// name. Failure reasons are appended in parentheses.
    pub fn render_table(&self) -> String {
        let width = self
            .models
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0);

        let mut lines = Vec::with_capacity(self.models.len());
        for report in self.models.values() {
            let mut line = format!(
                "{:<name_width$}  {:<9}  {}",
                report.model,
                report.status.label(),
                report.summary(),
                name_width = width,
            );
            if let ModelStatus::Failed(reason) = &report.status {
                line.push_str(&format!(" ({})", reason));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}
