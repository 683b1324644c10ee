// Custom field models and request payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{FieldId, ListId};
use crate::error::{AppError, AppResult};
use crate::fields::field_config::{validate_config, FieldConfig, FieldType};

pub const MAX_NAME_LENGTH: usize = 255;

/// A user-defined, typed attribute that can be attached to videos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCustomField")]
pub struct CustomField {
    pub id: FieldId,
    pub list_id: ListId,
    pub name: String,
    pub field_type: FieldType,
    pub config: FieldConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomField {
    pub fn new(list_id: ListId, name: String, config: FieldConfig) -> Self {
        let now = Utc::now();
        Self {
            id: FieldId::new(),
            list_id,
            name,
            field_type: config.field_type(),
            config,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Deserialize)]
struct RawCustomField {
    id: FieldId,
    list_id: ListId,
    name: String,
    field_type: FieldType,
    config: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RawCustomField> for CustomField {
    type Error = String;

    fn try_from(raw: RawCustomField) -> Result<Self, Self::Error> {
        let config = validate_config(raw.field_type, &raw.config).map_err(|e| e.to_string())?;
        Ok(Self {
            id: raw.id,
            list_id: raw.list_id,
            name: raw.name,
            field_type: raw.field_type,
            config,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

/// Payload for creating a field
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default = "empty_config")]
    pub config: Value,
}

/// Partial update. `field_type` is accepted only so a change can be refused
/// explicitly; it is never applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomFieldUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub field_type: Option<FieldType>,
}

fn empty_config() -> Value {
    Value::Object(Default::default())
}

/// Trim and check a field, schema or tag name
pub fn validate_name(kind: &str, name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} name must not be empty", kind)));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "{} name must be at most {} characters",
            kind, MAX_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}
