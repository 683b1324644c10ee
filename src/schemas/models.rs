// Field schema models and request payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{FieldId, ListId, SchemaId, TagId};

pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Binding of one custom field into one schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub schema_id: SchemaId,
    pub field_id: FieldId,
    pub display_order: i32,
    pub show_on_card: bool,
}

/// A binding as proposed by a caller, before it belongs to a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFieldInput {
    pub field_id: FieldId,
    pub display_order: i32,
    #[serde(default)]
    pub show_on_card: bool,
}

impl From<&SchemaField> for SchemaFieldInput {
    fn from(binding: &SchemaField) -> Self {
        Self {
            field_id: binding.field_id,
            display_order: binding.display_order,
            show_on_card: binding.show_on_card,
        }
    }
}

impl SchemaFieldInput {
    pub fn bind(self, schema_id: SchemaId) -> SchemaField {
        SchemaField {
            schema_id,
            field_id: self.field_id,
            display_order: self.display_order,
            show_on_card: self.show_on_card,
        }
    }
}

/// Named, reusable bundle of field bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub id: SchemaId,
    pub list_id: ListId,
    pub name: String,
    pub description: Option<String>,
    /// Sorted by `display_order`
    pub schema_fields: Vec<SchemaField>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FieldSchema {
    pub fn binding(&self, field_id: FieldId) -> Option<&SchemaField> {
        self.schema_fields.iter().find(|b| b.field_id == field_id)
    }

    pub fn inputs(&self) -> Vec<SchemaFieldInput> {
        self.schema_fields.iter().map(SchemaFieldInput::from).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFieldSchema {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<SchemaFieldInput>,
}

/// Metadata-only update; bindings have their own operations.
/// An empty description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSchemaUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to add one binding; without `display_order` it goes last
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewSchemaField {
    pub field_id: FieldId,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub show_on_card: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SchemaFieldUpdate {
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub show_on_card: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub field_id: FieldId,
    pub display_order: i32,
}

/// A tag optionally bound to one schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub list_id: ListId,
    pub name: String,
    pub schema_id: Option<SchemaId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    #[serde(default)]
    pub schema_id: Option<SchemaId>,
}

/// Check a description against the length limit; blank means none
pub fn normalize_description(description: Option<String>) -> Result<Option<String>, String> {
    match description {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => Err(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )),
        Some(text) => Ok(Some(text)),
    }
}
