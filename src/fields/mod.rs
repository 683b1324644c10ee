// Custom fields - type model, config validation and values

pub mod field_config;
pub mod field_value;
pub mod models;

pub use field_config::{validate_config, ConfigError, FieldConfig, FieldType};
pub use field_value::{parse_value, FieldValue, VideoFieldValue};
pub use models::{validate_name, CustomField, CustomFieldUpdate, NewCustomField};
