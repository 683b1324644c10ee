// Field values - typed values and their storage slots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{FieldId, ValueId, VideoId};
use crate::fields::field_config::FieldConfig;
use crate::fields::models::CustomField;

/// A single typed value of a custom field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Parse a raw JSON value against a field definition.
///
/// `Ok(None)` means the value is being cleared.
pub fn parse_value(field: &CustomField, raw: &Value) -> Result<Option<FieldValue>, String> {
    if raw.is_null() {
        return Ok(None);
    }

    match &field.config {
        FieldConfig::Select { options } => {
            let choice = raw
                .as_str()
                .ok_or_else(|| format!("'{}' expects one of its options as a string", field.name))?;
            if !options.iter().any(|option| option == choice) {
                return Err(format!("'{}' is not an option of '{}'", choice, field.name));
            }
            Ok(Some(FieldValue::Text(choice.to_string())))
        }
        FieldConfig::Rating { max_rating } => {
            let rating = raw
                .as_i64()
                .or_else(|| raw.as_f64().filter(|n| n.fract() == 0.0).map(|n| n as i64))
                .ok_or_else(|| format!("'{}' expects a whole-number rating", field.name))?;
            if rating < 0 || rating > *max_rating as i64 {
                return Err(format!(
                    "rating for '{}' must be between 0 and {}",
                    field.name, max_rating
                ));
            }
            Ok(Some(FieldValue::Number(rating as f64)))
        }
        FieldConfig::Text { max_length } => {
            let text = raw
                .as_str()
                .ok_or_else(|| format!("'{}' expects text", field.name))?;
            if let Some(max) = max_length {
                let length = text.chars().count();
                if length > *max as usize {
                    return Err(format!(
                        "'{}' accepts at most {} characters (got {})",
                        field.name, max, length
                    ));
                }
            }
            Ok(Some(FieldValue::Text(text.to_string())))
        }
        FieldConfig::Boolean {} => raw
            .as_bool()
            .map(|b| Some(FieldValue::Boolean(b)))
            .ok_or_else(|| format!("'{}' expects true or false", field.name)),
    }
}

/// Stored value of one field on one video. Exactly one slot is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFieldValue {
    pub id: ValueId,
    pub video_id: VideoId,
    pub field_id: FieldId,
    pub value_text: Option<String>,
    pub value_numeric: Option<f64>,
    pub value_boolean: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl VideoFieldValue {
    pub fn new(video_id: VideoId, field_id: FieldId, value: &FieldValue) -> Self {
        let mut stored = Self {
            id: ValueId::new(),
            video_id,
            field_id,
            value_text: None,
            value_numeric: None,
            value_boolean: None,
            updated_at: Utc::now(),
        };
        stored.set(value);
        stored
    }

    /// Overwrite the populated slot and refresh `updated_at`
    pub fn set(&mut self, value: &FieldValue) {
        self.value_text = value.as_text().map(str::to_string);
        self.value_numeric = value.as_number();
        self.value_boolean = value.as_bool();
        self.updated_at = Utc::now();
    }

    pub fn value(&self) -> Option<FieldValue> {
        if let Some(text) = &self.value_text {
            Some(FieldValue::Text(text.clone()))
        } else if let Some(n) = self.value_numeric {
            Some(FieldValue::Number(n))
        } else {
            self.value_boolean.map(FieldValue::Boolean)
        }
    }
}
