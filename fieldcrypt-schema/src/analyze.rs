//! Eligibility analysis over a schema document.
//!
//! Walks every model in the document, collects its `@encrypted` fields,
//! selects a pagination cursor, and splits the result into the models a
//! migration run will touch and the ones it will skip (with the reason, so
//! callers can log the exclusion). Eligibility is decided here, once, and
//! never revisited during a run.

use smol_str::SmolStr;
use tracing::debug;

use crate::document::{DocumentField, DocumentModel, SchemaDocument};
use crate::error::{SchemaError, SchemaResult};
use crate::model::{CursorField, CursorKind, EncryptedField, MigrationModel};

/// The outcome of analyzing a schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaAnalysis {
    /// Models with at least one encrypted field and a usable cursor,
    /// in declaration order.
    pub eligible: Vec<MigrationModel>,
    /// Models excluded from migration, with the reason.
    pub skipped: Vec<SkippedModel>,
}

impl SchemaAnalysis {
    /// Names of the eligible models, in declaration order.
    pub fn eligible_names(&self) -> Vec<SmolStr> {
        self.eligible.iter().map(|m| m.name.clone()).collect()
    }

    /// True when no model qualifies for migration.
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }
}

/// A model excluded before migration starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedModel {
    /// Model name.
    pub name: SmolStr,
    /// Why the model was excluded.
    pub reason: SkipReason,
}

/// Why a model was excluded from migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No field carries the `@encrypted` annotation.
    NoEncryptedFields,
    /// No field provides a strict total order to paginate by.
    NoCursor,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEncryptedFields => write!(f, "no encrypted fields"),
            Self::NoCursor => write!(f, "no usable cursor field"),
        }
    }
}

/// Analyze a schema document into eligible and skipped models.
///
/// Errors on an empty document and on duplicate model or field names; those
/// indicate a broken upstream reader rather than an ineligible schema.
pub fn analyze(document: &SchemaDocument) -> SchemaResult<SchemaAnalysis> {
    if document.models.is_empty() {
        return Err(SchemaError::EmptyDocument);
    }

    let mut seen = std::collections::HashSet::new();
    for model in &document.models {
        if !seen.insert(model.name.as_str()) {
            return Err(SchemaError::DuplicateModel {
                name: model.name.to_string(),
            });
        }
        check_duplicate_fields(model)?;
    }

    let mut eligible = Vec::new();
    let mut skipped = Vec::new();
    for model in &document.models {
        match analyze_model(model) {
            Ok(migration_model) => eligible.push(migration_model),
            Err(reason) => {
                debug!(model = %model.name, reason = %reason, "model skipped");
                skipped.push(SkippedModel {
                    name: model.name.clone(),
                    reason,
                });
            }
        }
    }

    Ok(SchemaAnalysis { eligible, skipped })
}

fn check_duplicate_fields(model: &DocumentModel) -> SchemaResult<()> {
    let mut seen = std::collections::HashSet::new();
    for field in &model.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                model: model.name.to_string(),
                field: field.name.to_string(),
            });
        }
    }
    Ok(())
}

fn analyze_model(model: &DocumentModel) -> Result<MigrationModel, SkipReason> {
    let fields = encrypted_fields(model);
    if fields.is_empty() {
        return Err(SkipReason::NoEncryptedFields);
    }
    let cursor = select_cursor(model).ok_or(SkipReason::NoCursor)?;

    let mut migration_model = MigrationModel::new(model.name.clone()).with_cursor(cursor);
    for field in fields {
        migration_model.add_field(field);
    }
    Ok(migration_model)
}

fn encrypted_fields(model: &DocumentModel) -> Vec<EncryptedField> {
    model
        .fields
        .iter()
        .filter(|f| f.is_encrypted() && !f.is_list)
        .map(|f| {
            let mut field = EncryptedField::new(f.name.clone());
            if let Some(params) = annotation_params(f) {
                field = field.with_annotation(params);
            }
            field
        })
        .collect()
}

/// Parameters trailing the marker, e.g. `mode=strict` in `@encrypted?mode=strict`.
fn annotation_params(field: &DocumentField) -> Option<String> {
    let doc = field.documentation.as_deref()?;
    doc.split_whitespace()
        .find_map(|token| token.strip_prefix("@encrypted?"))
        .map(str::to_string)
}

/// Select the pagination cursor for a model.
///
/// Preference order: the `@id` field when its type is a sortable scalar, then
/// the first `@unique` field of such a type. List fields never qualify.
fn select_cursor(model: &DocumentModel) -> Option<CursorField> {
    let candidate = |f: &&DocumentField| -> bool {
        !f.is_list && f.scalar_type().is_some_and(|t| t.is_sortable())
    };

    let chosen = model
        .fields
        .iter()
        .filter(candidate)
        .find(|f| f.is_id)
        .or_else(|| model.fields.iter().filter(candidate).find(|f| f.is_unique))?;

    let kind = if chosen.scalar_type().is_some_and(|t| t.is_integer()) {
        CursorKind::Int
    } else {
        CursorKind::Text
    };
    Some(CursorField::new(chosen.name.clone(), kind))
}
