// Schema field constraint validator
// Checks every binding invariant in one pass and reports all violations

use serde::Serialize;
use std::collections::HashMap;

use crate::core::FieldId;
use crate::schemas::models::SchemaFieldInput;

/// Maximum number of bindings per schema that may render on the video card
pub const MAX_SHOW_ON_CARD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ViolationLocation {
    /// Position of the offending binding in the submitted list
    Binding(usize),
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    DuplicateField,
    DuplicateDisplayOrder,
    NegativeDisplayOrder,
    ShowOnCardLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub location: ViolationLocation,
    pub rule: ViolationRule,
    pub message: String,
}

/// Validate a complete proposed binding list.
///
/// Runs in linear time. Each repeated `field_id` or `display_order` produces
/// one violation per occurrence after the first, located at that occurrence.
pub fn validate_schema_fields(bindings: &[SchemaFieldInput]) -> Result<(), Vec<SchemaViolation>> {
    let mut violations = Vec::new();
    let mut seen_fields: HashMap<FieldId, usize> = HashMap::with_capacity(bindings.len());
    let mut seen_orders: HashMap<i32, usize> = HashMap::with_capacity(bindings.len());
    let mut on_card = 0usize;

    for (index, binding) in bindings.iter().enumerate() {
        if binding.display_order < 0 {
            violations.push(SchemaViolation {
                location: ViolationLocation::Binding(index),
                rule: ViolationRule::NegativeDisplayOrder,
                message: format!(
                    "display_order must be non-negative (got {})",
                    binding.display_order
                ),
            });
        }

        let field_count = seen_fields.entry(binding.field_id).or_insert(0);
        *field_count += 1;
        if *field_count > 1 {
            violations.push(SchemaViolation {
                location: ViolationLocation::Binding(index),
                rule: ViolationRule::DuplicateField,
                message: format!("field {} is already part of this schema", binding.field_id),
            });
        }

        let order_count = seen_orders.entry(binding.display_order).or_insert(0);
        *order_count += 1;
        if *order_count > 1 {
            violations.push(SchemaViolation {
                location: ViolationLocation::Binding(index),
                rule: ViolationRule::DuplicateDisplayOrder,
                message: format!(
                    "display_order {} is used by another field",
                    binding.display_order
                ),
            });
        }

        if binding.show_on_card {
            on_card += 1;
        }
    }

    if on_card > MAX_SHOW_ON_CARD {
        violations.push(SchemaViolation {
            location: ViolationLocation::Schema,
            rule: ViolationRule::ShowOnCardLimit,
            message: format!(
                "at most {} fields can be shown on the card ({} selected)",
                MAX_SHOW_ON_CARD, on_card
            ),
        });
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
