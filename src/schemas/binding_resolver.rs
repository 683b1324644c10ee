// Schema/Tag binding resolution
// A video's editable fields are the union of the schemas bound to its tags

use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use crate::core::{FieldId, SchemaId};
use crate::fields::CustomField;
use crate::schemas::models::{FieldSchema, Tag};

/// A custom field that applies to a video, with the binding that placed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableField {
    pub field: CustomField,
    pub schema_id: SchemaId,
    pub display_order: i32,
    pub show_on_card: bool,
}

/// Compute the available fields for a video carrying `tags`.
///
/// When a field is reachable through several schemas, the binding with the
/// lowest `display_order` wins; on equal orders the schema met first (in tag
/// order) is kept. The result is sorted by order, then field name, then id.
pub fn resolve_available_fields(
    tags: &[Tag],
    schemas: &HashMap<SchemaId, FieldSchema>,
    fields: &HashMap<FieldId, CustomField>,
) -> Vec<AvailableField> {
    let mut chosen: HashMap<FieldId, AvailableField> = HashMap::new();

    for schema_id in tags.iter().filter_map(|tag| tag.schema_id) {
        let Some(schema) = schemas.get(&schema_id) else {
            warn!("Tag references schema {} which was not loaded", schema_id);
            continue;
        };

        for binding in &schema.schema_fields {
            let Some(field) = fields.get(&binding.field_id) else {
                warn!(
                    "Schema {} binds field {} which no longer exists",
                    schema.id, binding.field_id
                );
                continue;
            };

            let replace = match chosen.get(&binding.field_id) {
                Some(existing) => binding.display_order < existing.display_order,
                None => true,
            };
            if replace {
                chosen.insert(
                    binding.field_id,
                    AvailableField {
                        field: field.clone(),
                        schema_id: schema.id,
                        display_order: binding.display_order,
                        show_on_card: binding.show_on_card,
                    },
                );
            }
        }
    }

    let mut available: Vec<AvailableField> = chosen.into_values().collect();
    available.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.field.name.cmp(&b.field.name))
            .then_with(|| a.field.id.cmp(&b.field.id))
    });
    available
}
