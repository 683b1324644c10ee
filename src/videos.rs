// Videos and batched field value updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{FieldId, ListId, VideoId};
use crate::fields::{FieldType, FieldValue};

/// A bookmarked video; only what custom fields need to hang off it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub list_id: ListId,
    pub youtube_url: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVideo {
    pub youtube_url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One entry of a batch update; `null` clears the stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValueUpdate {
    pub field_id: FieldId,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchUpdateRequest {
    pub updates: Vec<FieldValueUpdate>,
}

/// A written value echoed back with its field metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedFieldValue {
    pub field_id: FieldId,
    pub field_name: String,
    pub field_type: FieldType,
    pub value: Option<FieldValue>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUpdateErrorKind {
    NotFound,
    Validation,
    /// The value was valid but could not be written; the entry may be retried
    Storage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdateError {
    pub field_id: FieldId,
    pub kind: FieldUpdateErrorKind,
    pub message: String,
}

/// Per-field outcome of a batch: successes and failures side by side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateResponse {
    pub updated: Vec<UpdatedFieldValue>,
    pub errors: Vec<FieldUpdateError>,
}

impl BatchUpdateResponse {
    pub fn error_for(&self, field_id: FieldId) -> Option<&FieldUpdateError> {
        self.errors.iter().find(|e| e.field_id == field_id)
    }

    pub fn updated_for(&self, field_id: FieldId) -> Option<&UpdatedFieldValue> {
        self.updated.iter().find(|u| u.field_id == field_id)
    }
}

/// An available field of a video together with its current value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoFieldView {
    #[serde(flatten)]
    pub available: crate::schemas::AvailableField,
    pub value: Option<FieldValue>,
    pub updated_at: Option<DateTime<Utc>>,
}
