// Field type model and config validator
// The tag (field_type) and payload (config) are always checked together

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Highest `max_rating` a rating field may declare
pub const MAX_RATING_LIMIT: i64 = 10;

/// The four kinds of custom field. Immutable once a field is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Select,
    Rating,
    Text,
    Boolean,
}

impl FieldType {
    pub const ALL: [FieldType; 4] = [
        FieldType::Select,
        FieldType::Rating,
        FieldType::Text,
        FieldType::Boolean,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Select => "select",
            FieldType::Rating => "rating",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "select" => Some(FieldType::Select),
            "rating" => Some(FieldType::Rating),
            "text" => Some(FieldType::Text),
            "boolean" => Some(FieldType::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated config payload. Only constructed through [`validate_config`],
/// so every value is known to match its field type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldConfig {
    Select {
        options: Vec<String>,
    },
    Rating {
        max_rating: u8,
    },
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },
    Boolean {},
}

impl FieldConfig {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldConfig::Select { .. } => FieldType::Select,
            FieldConfig::Rating { .. } => FieldType::Rating,
            FieldConfig::Text { .. } => FieldType::Text,
            FieldConfig::Boolean {} => FieldType::Boolean,
        }
    }

    /// JSON form as stored and sent over the wire
    pub fn to_json(&self) -> Value {
        match self {
            FieldConfig::Select { options } => serde_json::json!({ "options": options }),
            FieldConfig::Rating { max_rating } => serde_json::json!({ "max_rating": max_rating }),
            FieldConfig::Text { max_length: Some(max) } => serde_json::json!({ "max_length": max }),
            FieldConfig::Text { max_length: None } | FieldConfig::Boolean {} => {
                Value::Object(Map::new())
            }
        }
    }
}

/// A config rejected for its declared field type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigError {
    pub field_type: FieldType,
    /// Key path of the offending part, e.g. `config.options[1]`
    pub path: String,
    pub message: String,
}

impl ConfigError {
    fn new(field_type: FieldType, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_type,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} config at {}: {}", self.field_type, self.path, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Validate `config` against `field_type`.
///
/// Keys must match the expected shape exactly: unknown keys are rejected and
/// nothing is coerced. A rating config carrying `options` fails even when its
/// `max_rating` is valid.
pub fn validate_config(field_type: FieldType, config: &Value) -> Result<FieldConfig, ConfigError> {
    let object = config.as_object().ok_or_else(|| {
        ConfigError::new(field_type, "config", "config must be a JSON object")
    })?;

    match field_type {
        FieldType::Select => {
            reject_unknown_keys(field_type, object, &["options"])?;
            let options = object
                .get("options")
                .ok_or_else(|| ConfigError::new(field_type, "config.options", "options is required"))?
                .as_array()
                .ok_or_else(|| {
                    ConfigError::new(field_type, "config.options", "options must be a list")
                })?;
            if options.is_empty() {
                return Err(ConfigError::new(
                    field_type,
                    "config.options",
                    "options must contain at least one entry",
                ));
            }
            let mut parsed = Vec::with_capacity(options.len());
            for (index, option) in options.iter().enumerate() {
                let path = format!("config.options[{}]", index);
                let text = option
                    .as_str()
                    .ok_or_else(|| ConfigError::new(field_type, path.clone(), "option must be a string"))?;
                if text.trim().is_empty() {
                    return Err(ConfigError::new(field_type, path, "option must not be empty"));
                }
                parsed.push(text.to_string());
            }
            Ok(FieldConfig::Select { options: parsed })
        }
        FieldType::Rating => {
            reject_unknown_keys(field_type, object, &["max_rating"])?;
            let raw = object.get("max_rating").ok_or_else(|| {
                ConfigError::new(field_type, "config.max_rating", "max_rating is required")
            })?;
            let max_rating = raw.as_i64().ok_or_else(|| {
                ConfigError::new(field_type, "config.max_rating", "max_rating must be an integer")
            })?;
            if !(1..=MAX_RATING_LIMIT).contains(&max_rating) {
                return Err(ConfigError::new(
                    field_type,
                    "config.max_rating",
                    format!("max_rating must be between 1 and {}", MAX_RATING_LIMIT),
                ));
            }
            Ok(FieldConfig::Rating {
                max_rating: max_rating as u8,
            })
        }
        FieldType::Text => {
            reject_unknown_keys(field_type, object, &["max_length"])?;
            let max_length = match object.get("max_length") {
                None | Some(Value::Null) => None,
                Some(raw) => {
                    let value = raw.as_i64().ok_or_else(|| {
                        ConfigError::new(field_type, "config.max_length", "max_length must be an integer")
                    })?;
                    if value < 1 || value > u32::MAX as i64 {
                        return Err(ConfigError::new(
                            field_type,
                            "config.max_length",
                            "max_length must be a positive integer",
                        ));
                    }
                    Some(value as u32)
                }
            };
            Ok(FieldConfig::Text { max_length })
        }
        FieldType::Boolean => {
            reject_unknown_keys(field_type, object, &[])?;
            Ok(FieldConfig::Boolean {})
        }
    }
}

fn reject_unknown_keys(
    field_type: FieldType,
    object: &Map<String, Value>,
    allowed: &[&str],
) -> Result<(), ConfigError> {
    match object.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(ConfigError::new(
            field_type,
            format!("config.{}", key),
            format!("unexpected key '{}' for a {} field", key, field_type),
        )),
        None => Ok(()),
    }
}
