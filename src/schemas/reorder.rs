// Binding reorder - atomic batch when available, tracked sequential fallback

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::core::{FieldId, SchemaId};
use crate::error::{AppError, AppResult};
use crate::schemas::constraints::validate_schema_fields;
use crate::schemas::models::{FieldSchema, ReorderEntry, SchemaField, SchemaFieldInput, SchemaFieldUpdate};

/// Operations a reorder needs from whoever owns the bindings
#[async_trait]
pub trait BindingMutator: Send + Sync {
    /// Whether `reorder_bindings` applies all entries in one transaction
    fn supports_batch_reorder(&self) -> bool {
        false
    }

    async fn load_schema(&self, schema_id: SchemaId) -> AppResult<FieldSchema>;

    async fn reorder_bindings(
        &self,
        schema_id: SchemaId,
        entries: &[ReorderEntry],
    ) -> AppResult<FieldSchema>;

    async fn update_binding(
        &self,
        schema_id: SchemaId,
        field_id: FieldId,
        update: SchemaFieldUpdate,
    ) -> AppResult<SchemaField>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderMode {
    Atomic,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    /// Temporary order above every existing one
    Park,
    Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReorderStep {
    pub field_id: FieldId,
    pub display_order: i32,
    pub phase: StepPhase,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderFailure {
    pub step: ReorderStep,
    pub message: String,
}

/// Outcome of a reorder. A sequential run that stops midway leaves the
/// schema partially reordered; `applied` and `pending` say exactly how far.
#[derive(Debug, Clone, Serialize)]
pub struct ReorderReport {
    pub mode: ReorderMode,
    pub applied: Vec<ReorderStep>,
    pub failed: Option<ReorderFailure>,
    pub pending: Vec<ReorderStep>,
}

impl ReorderReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none() && self.pending.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        !self.is_complete() && !self.applied.is_empty()
    }
}

/// Move bindings to new display orders.
///
/// The final binding set is validated before anything is sent. Errors
/// returned here mean nothing was applied; a report with `failed` set means
/// some steps were.
pub async fn apply_reorder<M>(
    mutator: &M,
    schema_id: SchemaId,
    entries: &[ReorderEntry],
) -> AppResult<ReorderReport>
where
    M: BindingMutator + ?Sized,
{
    let schema = mutator.load_schema(schema_id).await?;
    let final_bindings = reordered_inputs(&schema, entries)?;
    validate_schema_fields(&final_bindings).map_err(AppError::SchemaViolations)?;

    let current: HashMap<FieldId, i32> = schema
        .schema_fields
        .iter()
        .map(|b| (b.field_id, b.display_order))
        .collect();
    let moves: Vec<ReorderEntry> = entries
        .iter()
        .filter(|e| current.get(&e.field_id) != Some(&e.display_order))
        .copied()
        .collect();

    if mutator.supports_batch_reorder() {
        mutator.reorder_bindings(schema_id, &moves).await?;
        info!("Reordered {} bindings of schema {} atomically", moves.len(), schema_id);
        return Ok(ReorderReport {
            mode: ReorderMode::Atomic,
            applied: moves
                .iter()
                .map(|m| ReorderStep {
                    field_id: m.field_id,
                    display_order: m.display_order,
                    phase: StepPhase::Place,
                })
                .collect(),
            failed: None,
            pending: Vec::new(),
        });
    }

    let highest = schema
        .schema_fields
        .iter()
        .map(|b| b.display_order)
        .chain(moves.iter().map(|m| m.display_order))
        .max()
        .unwrap_or(0);
    let no_room = || {
        AppError::Validation(format!(
            "display orders of schema {} leave no room to park {} moved bindings",
            schema_id,
            moves.len()
        ))
    };

    let mut steps = Vec::with_capacity(moves.len() * 2);
    for (i, m) in moves.iter().enumerate() {
        let offset = i32::try_from(i + 1).map_err(|_| no_room())?;
        steps.push(ReorderStep {
            field_id: m.field_id,
            display_order: highest.checked_add(offset).ok_or_else(no_room)?,
            phase: StepPhase::Park,
        });
    }
    steps.extend(moves.iter().map(|m| ReorderStep {
        field_id: m.field_id,
        display_order: m.display_order,
        phase: StepPhase::Place,
    }));

    let mut applied = Vec::with_capacity(steps.len());
    let mut remaining = steps.into_iter();
    while let Some(step) = remaining.next() {
        let update = SchemaFieldUpdate {
            display_order: Some(step.display_order),
            show_on_card: None,
        };
        match mutator.update_binding(schema_id, step.field_id, update).await {
            Ok(_) => applied.push(step),
            Err(e) => {
                warn!(
                    "Sequential reorder of schema {} stopped after {} steps: {}",
                    schema_id,
                    applied.len(),
                    e
                );
                return Ok(ReorderReport {
                    mode: ReorderMode::Sequential,
                    applied,
                    failed: Some(ReorderFailure {
                        step,
                        message: e.to_string(),
                    }),
                    pending: remaining.collect(),
                });
            }
        }
    }

    Ok(ReorderReport {
        mode: ReorderMode::Sequential,
        applied,
        failed: None,
        pending: Vec::new(),
    })
}

/// The schema's binding set with `entries` applied
pub fn reordered_inputs(
    schema: &FieldSchema,
    entries: &[ReorderEntry],
) -> AppResult<Vec<SchemaFieldInput>> {
    let mut inputs = schema.inputs();
    for entry in entries {
        let binding = inputs
            .iter_mut()
            .find(|b| b.field_id == entry.field_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Field {} is not part of schema {}",
                    entry.field_id, schema.id
                ))
            })?;
        binding.display_order = entry.display_order;
    }
    Ok(inputs)
}
