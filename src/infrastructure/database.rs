// Database Interface - persistence boundary for fields, schemas, tags, videos and values
// Implementations only store and load; every business rule lives in the service layer

use async_trait::async_trait;

use crate::core::{FieldId, ListId, SchemaId, TagId, VideoId};
use crate::error::AppResult;
use crate::fields::{CustomField, FieldValue, VideoFieldValue};
use crate::schemas::{FieldSchema, SchemaField, Tag};
use crate::videos::Video;

#[async_trait]
pub trait FieldStore: Send + Sync {
    // Custom fields
    async fn insert_field(&self, field: &CustomField) -> AppResult<()>;
    async fn get_field(&self, id: FieldId) -> AppResult<Option<CustomField>>;
    async fn get_fields(&self, ids: &[FieldId]) -> AppResult<Vec<CustomField>>;
    async fn list_fields(&self, list_id: ListId) -> AppResult<Vec<CustomField>>;
    /// Case-insensitive lookup within a list
    async fn find_field_by_name(&self, list_id: ListId, name: &str)
        -> AppResult<Option<CustomField>>;
    /// Persists name, config and `updated_at`
    async fn update_field(&self, field: &CustomField) -> AppResult<()>;
    /// Deletes the field and every stored value of it
    async fn delete_field(&self, id: FieldId) -> AppResult<bool>;
    async fn count_field_bindings(&self, id: FieldId) -> AppResult<u64>;

    // Schemas and bindings
    /// Inserts the schema and its bindings in one transaction
    async fn insert_schema(&self, schema: &FieldSchema) -> AppResult<()>;
    async fn get_schema(&self, id: SchemaId) -> AppResult<Option<FieldSchema>>;
    async fn list_schemas(&self, list_id: ListId) -> AppResult<Vec<FieldSchema>>;
    /// Persists name, description and `updated_at`
    async fn update_schema(&self, schema: &FieldSchema) -> AppResult<()>;
    /// Replaces the full binding set in one transaction
    async fn replace_schema_fields(&self, id: SchemaId, bindings: &[SchemaField]) -> AppResult<()>;
    /// Deletes the schema and cascades to its bindings
    async fn delete_schema(&self, id: SchemaId) -> AppResult<bool>;
    async fn count_schema_tags(&self, id: SchemaId) -> AppResult<u64>;

    // Tags
    async fn insert_tag(&self, tag: &Tag) -> AppResult<()>;
    async fn get_tag(&self, id: TagId) -> AppResult<Option<Tag>>;
    async fn set_tag_schema(&self, id: TagId, schema_id: Option<SchemaId>) -> AppResult<bool>;

    // Videos
    async fn insert_video(&self, video: &Video) -> AppResult<()>;
    async fn get_video(&self, id: VideoId) -> AppResult<Option<Video>>;
    async fn add_video_tag(&self, video_id: VideoId, tag_id: TagId) -> AppResult<()>;
    async fn video_tags(&self, video_id: VideoId) -> AppResult<Vec<Tag>>;

    // Field values
    async fn upsert_value(
        &self,
        video_id: VideoId,
        field_id: FieldId,
        value: &FieldValue,
    ) -> AppResult<VideoFieldValue>;
    async fn delete_value(&self, video_id: VideoId, field_id: FieldId) -> AppResult<bool>;
    async fn list_values(&self, video_id: VideoId) -> AppResult<Vec<VideoFieldValue>>;
}
