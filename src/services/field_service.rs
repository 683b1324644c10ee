// FieldService - business operations over custom fields, schemas, tags and values
// Every mutation is re-validated here; callers' client-side checks are advisory

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::autosave::ValueSink;
use crate::core::{FieldId, ListId, SchemaId, TagId, VideoId};
use crate::error::{AppError, AppResult};
use crate::fields::{
    parse_value, validate_config, validate_name, CustomField, CustomFieldUpdate, NewCustomField,
};
use crate::infrastructure::{FieldCache, FieldStore};
use crate::schemas::models::normalize_description;
use crate::schemas::reorder::reordered_inputs;
use crate::schemas::{
    resolve_available_fields, validate_schema_fields, AvailableField, BindingMutator, FieldSchema,
    FieldSchemaUpdate, NewFieldSchema, NewSchemaField, NewTag, ReorderEntry, SchemaField,
    SchemaFieldInput, SchemaFieldUpdate, Tag,
};
use crate::videos::{
    BatchUpdateResponse, FieldUpdateError, FieldUpdateErrorKind, FieldValueUpdate, NewVideo,
    UpdatedFieldValue, Video, VideoFieldView,
};

pub struct FieldService {
    store: Arc<dyn FieldStore>,
    field_cache: FieldCache,
}

impl FieldService {
    pub fn new(store: Arc<dyn FieldStore>, cache_capacity: usize) -> Self {
        Self {
            store,
            field_cache: FieldCache::new(cache_capacity),
        }
    }

    // ---- Custom fields ----

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_field(
        &self,
        list_id: ListId,
        request: NewCustomField,
    ) -> AppResult<CustomField> {
        let name = validate_name("field", &request.name)?;
        let config = validate_config(request.field_type, &request.config).map_err(|e| {
            warn!("Rejected field config: {}", e);
            AppError::InvalidConfig(e)
        })?;

        if let Some(existing) = self.store.find_field_by_name(list_id, &name).await? {
            return Err(AppError::Conflict(format!(
                "A field named '{}' already exists",
                existing.name
            )));
        }

        let field = CustomField::new(list_id, name, config);
        self.store.insert_field(&field).await?;
        info!("Created {} field {} ({})", field.field_type, field.name, field.id);
        self.field_cache.insert(field.clone());
        Ok(field)
    }

    pub async fn get_field(&self, id: FieldId) -> AppResult<CustomField> {
        if let Some(field) = self.field_cache.get(id) {
            return Ok(field);
        }
        let field = self
            .store
            .get_field(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Field {} not found", id)))?;
        self.field_cache.insert(field.clone());
        Ok(field)
    }

    pub async fn list_fields(&self, list_id: ListId) -> AppResult<Vec<CustomField>> {
        self.store.list_fields(list_id).await
    }

    /// Existing field whose name matches case-insensitively, if any
    pub async fn check_duplicate_name(
        &self,
        list_id: ListId,
        name: &str,
    ) -> AppResult<Option<CustomField>> {
        self.store.find_field_by_name(list_id, name).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_field(
        &self,
        id: FieldId,
        update: CustomFieldUpdate,
    ) -> AppResult<CustomField> {
        let mut field = self.get_field(id).await?;

        if let Some(requested) = update.field_type {
            if requested != field.field_type {
                return Err(AppError::Validation(format!(
                    "field_type cannot be changed from {} to {}",
                    field.field_type, requested
                )));
            }
        }

        if let Some(name) = update.name {
            let name = validate_name("field", &name)?;
            if let Some(existing) = self.store.find_field_by_name(field.list_id, &name).await? {
                if existing.id != field.id {
                    return Err(AppError::Conflict(format!(
                        "A field named '{}' already exists",
                        existing.name
                    )));
                }
            }
            field.name = name;
        }

        if let Some(config) = update.config {
            field.config = validate_config(field.field_type, &config)?;
        }

        field.updated_at = Utc::now();
        self.store.update_field(&field).await?;
        self.field_cache.invalidate(id);
        info!("Updated field {}", id);
        Ok(field)
    }

    #[instrument(skip(self))]
    pub async fn delete_field(&self, id: FieldId) -> AppResult<()> {
        let field = self.get_field(id).await?;
        let bindings = self.store.count_field_bindings(id).await?;
        if bindings > 0 {
            warn!("Refusing to delete field {} bound to {} schemas", id, bindings);
            return Err(AppError::Conflict(format!(
                "Field '{}' is used by {} schema(s); remove it from them first",
                field.name, bindings
            )));
        }
        self.store.delete_field(id).await?;
        self.field_cache.invalidate(id);
        info!("Deleted field {}", id);
        Ok(())
    }

    // ---- Schemas ----

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_schema(
        &self,
        list_id: ListId,
        request: NewFieldSchema,
    ) -> AppResult<FieldSchema> {
        let name = validate_name("schema", &request.name)?;
        let description = normalize_description(request.description).map_err(AppError::Validation)?;
        validate_schema_fields(&request.fields).map_err(|violations| {
            warn!("Rejected schema with {} violations", violations.len());
            AppError::SchemaViolations(violations)
        })?;
        let field_ids: Vec<FieldId> = request.fields.iter().map(|f| f.field_id).collect();
        self.ensure_fields_in_list(list_id, &field_ids).await?;

        let now = Utc::now();
        let id = SchemaId::new();
        let mut schema_fields: Vec<SchemaField> =
            request.fields.into_iter().map(|input| input.bind(id)).collect();
        schema_fields.sort_by_key(|b| b.display_order);
        let schema = FieldSchema {
            id,
            list_id,
            name,
            description,
            schema_fields,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_schema(&schema).await?;
        info!("Created schema {} with {} fields", schema.id, schema.schema_fields.len());
        Ok(schema)
    }

    pub async fn get_schema(&self, id: SchemaId) -> AppResult<FieldSchema> {
        self.store
            .get_schema(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Schema {} not found", id)))
    }

    pub async fn list_schemas(&self, list_id: ListId) -> AppResult<Vec<FieldSchema>> {
        self.store.list_schemas(list_id).await
    }

    pub async fn update_schema(
        &self,
        id: SchemaId,
        update: FieldSchemaUpdate,
    ) -> AppResult<FieldSchema> {
        let mut schema = self.get_schema(id).await?;
        if let Some(name) = update.name {
            schema.name = validate_name("schema", &name)?;
        }
        if update.description.is_some() {
            schema.description =
                normalize_description(update.description).map_err(AppError::Validation)?;
        }
        schema.updated_at = Utc::now();
        self.store.update_schema(&schema).await?;
        Ok(schema)
    }

    #[instrument(skip(self))]
    pub async fn delete_schema(&self, id: SchemaId) -> AppResult<()> {
        let schema = self.get_schema(id).await?;
        let tags = self.store.count_schema_tags(id).await?;
        if tags > 0 {
            return Err(AppError::Conflict(format!(
                "Schema '{}' is bound to {} tag(s); unbind it first",
                schema.name, tags
            )));
        }
        self.store.delete_schema(id).await?;
        info!("Deleted schema {}", id);
        Ok(())
    }

    pub async fn add_schema_field(
        &self,
        schema_id: SchemaId,
        request: NewSchemaField,
    ) -> AppResult<FieldSchema> {
        let schema = self.get_schema(schema_id).await?;
        self.ensure_fields_in_list(schema.list_id, &[request.field_id]).await?;

        let display_order = match request.display_order {
            Some(order) => order,
            None => match schema.schema_fields.iter().map(|b| b.display_order).max() {
                None => 0,
                Some(last) => last.checked_add(1).ok_or_else(|| {
                    AppError::Validation(
                        "no display_order left after the last binding; pass one explicitly"
                            .to_string(),
                    )
                })?,
            },
        };
        let mut inputs = schema.inputs();
        inputs.push(SchemaFieldInput {
            field_id: request.field_id,
            display_order,
            show_on_card: request.show_on_card,
        });
        self.commit_bindings(schema, inputs).await
    }

    pub async fn update_schema_field(
        &self,
        schema_id: SchemaId,
        field_id: FieldId,
        update: SchemaFieldUpdate,
    ) -> AppResult<FieldSchema> {
        let schema = self.get_schema(schema_id).await?;
        let mut inputs = schema.inputs();
        let binding = inputs
            .iter_mut()
            .find(|b| b.field_id == field_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Field {} is not part of schema {}", field_id, schema_id))
            })?;
        if let Some(order) = update.display_order {
            binding.display_order = order;
        }
        if let Some(show) = update.show_on_card {
            binding.show_on_card = show;
        }
        self.commit_bindings(schema, inputs).await
    }

    pub async fn remove_schema_field(
        &self,
        schema_id: SchemaId,
        field_id: FieldId,
    ) -> AppResult<FieldSchema> {
        let schema = self.get_schema(schema_id).await?;
        if schema.binding(field_id).is_none() {
            return Err(AppError::NotFound(format!(
                "Field {} is not part of schema {}",
                field_id, schema_id
            )));
        }
        let inputs = schema
            .inputs()
            .into_iter()
            .filter(|b| b.field_id != field_id)
            .collect();
        self.commit_bindings(schema, inputs).await
    }

    /// Apply every entry in one transaction
    pub async fn reorder_schema_fields(
        &self,
        schema_id: SchemaId,
        entries: &[ReorderEntry],
    ) -> AppResult<FieldSchema> {
        let schema = self.get_schema(schema_id).await?;
        let inputs = reordered_inputs(&schema, entries)?;
        self.commit_bindings(schema, inputs).await
    }

    async fn commit_bindings(
        &self,
        schema: FieldSchema,
        inputs: Vec<SchemaFieldInput>,
    ) -> AppResult<FieldSchema> {
        validate_schema_fields(&inputs).map_err(|violations| {
            warn!(
                "Rejected binding change on schema {}: {} violations",
                schema.id,
                violations.len()
            );
            AppError::SchemaViolations(violations)
        })?;
        let bindings: Vec<SchemaField> = inputs.into_iter().map(|i| i.bind(schema.id)).collect();
        self.store.replace_schema_fields(schema.id, &bindings).await?;
        self.get_schema(schema.id).await
    }

    async fn ensure_fields_in_list(&self, list_id: ListId, field_ids: &[FieldId]) -> AppResult<()> {
        let found: HashMap<FieldId, CustomField> = self
            .store
            .get_fields(field_ids)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();
        for id in field_ids {
            match found.get(id) {
                None => return Err(AppError::NotFound(format!("Field {} not found", id))),
                Some(field) if field.list_id != list_id => {
                    return Err(AppError::Validation(format!(
                        "Field '{}' belongs to a different list",
                        field.name
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    // ---- Tags and videos ----

    pub async fn create_tag(&self, list_id: ListId, request: NewTag) -> AppResult<Tag> {
        let name = validate_name("tag", &request.name)?;
        if let Some(schema_id) = request.schema_id {
            self.ensure_schema_in_list(list_id, schema_id).await?;
        }
        let tag = Tag {
            id: TagId::new(),
            list_id,
            name,
            schema_id: request.schema_id,
        };
        self.store.insert_tag(&tag).await?;
        info!("Created tag {} ({})", tag.name, tag.id);
        Ok(tag)
    }

    pub async fn set_tag_schema(&self, tag_id: TagId, schema_id: Option<SchemaId>) -> AppResult<Tag> {
        let mut tag = self.get_tag(tag_id).await?;
        if let Some(schema_id) = schema_id {
            self.ensure_schema_in_list(tag.list_id, schema_id).await?;
        }
        self.store.set_tag_schema(tag_id, schema_id).await?;
        tag.schema_id = schema_id;
        Ok(tag)
    }

    async fn get_tag(&self, id: TagId) -> AppResult<Tag> {
        self.store
            .get_tag(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag {} not found", id)))
    }

    async fn ensure_schema_in_list(&self, list_id: ListId, schema_id: SchemaId) -> AppResult<()> {
        let schema = self.get_schema(schema_id).await?;
        if schema.list_id != list_id {
            return Err(AppError::Validation(format!(
                "Schema '{}' belongs to a different list",
                schema.name
            )));
        }
        Ok(())
    }

    pub async fn create_video(&self, list_id: ListId, request: NewVideo) -> AppResult<Video> {
        let youtube_url = request.youtube_url.trim().to_string();
        if youtube_url.is_empty() {
            return Err(AppError::Validation("youtube_url must not be empty".to_string()));
        }
        let video = Video {
            id: VideoId::new(),
            list_id,
            youtube_url,
            title: request.title,
            created_at: Utc::now(),
        };
        self.store.insert_video(&video).await?;
        Ok(video)
    }

    async fn get_video(&self, id: VideoId) -> AppResult<Video> {
        self.store
            .get_video(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    pub async fn tag_video(&self, video_id: VideoId, tag_id: TagId) -> AppResult<Vec<Tag>> {
        let video = self.get_video(video_id).await?;
        let tag = self.get_tag(tag_id).await?;
        if tag.list_id != video.list_id {
            return Err(AppError::Validation(format!(
                "Tag '{}' belongs to a different list",
                tag.name
            )));
        }
        self.store.add_video_tag(video_id, tag_id).await?;
        self.store.video_tags(video_id).await
    }

    /// Union of the fields of every schema bound to the video's tags
    pub async fn available_fields(&self, video_id: VideoId) -> AppResult<Vec<AvailableField>> {
        self.get_video(video_id).await?;
        let tags = self.store.video_tags(video_id).await?;

        let schema_ids: Vec<SchemaId> = tags
            .iter()
            .filter_map(|t| t.schema_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let schemas: HashMap<SchemaId, FieldSchema> =
            try_join_all(schema_ids.iter().map(|id| self.store.get_schema(*id)))
                .await?
                .into_iter()
                .flatten()
                .map(|s| (s.id, s))
                .collect();

        let field_ids: Vec<FieldId> = schemas
            .values()
            .flat_map(|s| s.schema_fields.iter().map(|b| b.field_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let fields: HashMap<FieldId, CustomField> = self
            .store
            .get_fields(&field_ids)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        Ok(resolve_available_fields(&tags, &schemas, &fields))
    }

    /// Available fields with their current stored values
    pub async fn video_fields(&self, video_id: VideoId) -> AppResult<Vec<VideoFieldView>> {
        let available = self.available_fields(video_id).await?;
        let mut values: HashMap<FieldId, _> = self
            .store
            .list_values(video_id)
            .await?
            .into_iter()
            .map(|v| (v.field_id, v))
            .collect();

        Ok(available
            .into_iter()
            .map(|available| {
                let stored = values.remove(&available.field.id);
                VideoFieldView {
                    value: stored.as_ref().and_then(|v| v.value()),
                    updated_at: stored.map(|v| v.updated_at),
                    available,
                }
            })
            .collect())
    }

    // ---- Values ----

    /// Write several values of one video. Each entry succeeds or fails on its
    /// own; the response lists both.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn batch_update_values(
        &self,
        video_id: VideoId,
        updates: Vec<FieldValueUpdate>,
    ) -> AppResult<BatchUpdateResponse> {
        let available: HashMap<FieldId, CustomField> = self
            .available_fields(video_id)
            .await?
            .into_iter()
            .map(|a| (a.field.id, a.field))
            .collect();

        let mut response = BatchUpdateResponse::default();
        let mut seen = HashSet::new();

        for update in updates {
            let field_id = update.field_id;
            if !seen.insert(field_id) {
                response.errors.push(FieldUpdateError {
                    field_id,
                    kind: FieldUpdateErrorKind::Validation,
                    message: "field listed more than once in the same batch".to_string(),
                });
                continue;
            }

            let Some(field) = available.get(&field_id) else {
                let (kind, message) = match self.get_field(field_id).await {
                    Ok(field) => (
                        FieldUpdateErrorKind::Validation,
                        format!("'{}' is not available for this video", field.name),
                    ),
                    Err(AppError::NotFound(msg)) => (FieldUpdateErrorKind::NotFound, msg),
                    Err(e) => {
                        error!("Failed to look up field {}: {}", field_id, e);
                        (FieldUpdateErrorKind::Storage, "field could not be loaded; retry".to_string())
                    }
                };
                response.errors.push(FieldUpdateError {
                    field_id,
                    kind,
                    message,
                });
                continue;
            };

            let value = match parse_value(field, &update.value) {
                Ok(value) => value,
                Err(message) => {
                    response.errors.push(FieldUpdateError {
                        field_id,
                        kind: FieldUpdateErrorKind::Validation,
                        message,
                    });
                    continue;
                }
            };

            // A storage failure only fails this entry; earlier writes are kept
            let written = match &value {
                Some(value) => self
                    .store
                    .upsert_value(video_id, field_id, value)
                    .await
                    .map(|stored| (stored.value(), stored.updated_at)),
                None => self
                    .store
                    .delete_value(video_id, field_id)
                    .await
                    .map(|_| (None, Utc::now())),
            };
            match written {
                Ok((value, updated_at)) => response.updated.push(UpdatedFieldValue {
                    field_id,
                    field_name: field.name.clone(),
                    field_type: field.field_type,
                    value,
                    updated_at,
                }),
                Err(e) => {
                    error!("Failed to write field {} on video {}: {}", field_id, video_id, e);
                    response.errors.push(FieldUpdateError {
                        field_id,
                        kind: FieldUpdateErrorKind::Storage,
                        message: "value could not be stored; retry".to_string(),
                    });
                }
            }
        }

        if !response.errors.is_empty() {
            warn!(
                "Batch update on video {}: {} written, {} rejected",
                video_id,
                response.updated.len(),
                response.errors.len()
            );
        }
        Ok(response)
    }
}

#[async_trait]
impl BindingMutator for FieldService {
    fn supports_batch_reorder(&self) -> bool {
        true
    }

    async fn load_schema(&self, schema_id: SchemaId) -> AppResult<FieldSchema> {
        self.get_schema(schema_id).await
    }

    async fn reorder_bindings(
        &self,
        schema_id: SchemaId,
        entries: &[ReorderEntry],
    ) -> AppResult<FieldSchema> {
        self.reorder_schema_fields(schema_id, entries).await
    }

    async fn update_binding(
        &self,
        schema_id: SchemaId,
        field_id: FieldId,
        update: SchemaFieldUpdate,
    ) -> AppResult<SchemaField> {
        let schema = self.update_schema_field(schema_id, field_id, update).await?;
        schema
            .binding(field_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("Binding of field {} vanished", field_id)))
    }
}

#[async_trait]
impl ValueSink for FieldService {
    async fn save_values(
        &self,
        video_id: VideoId,
        updates: Vec<FieldValueUpdate>,
    ) -> AppResult<BatchUpdateResponse> {
        self.batch_update_values(video_id, updates).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldType, FieldValue};
    use crate::infrastructure::SqliteFieldStore;
    use crate::schemas::{ViolationRule, MAX_SHOW_ON_CARD};
    use serde_json::{json, Value};

    async fn service() -> FieldService {
        let store = SqliteFieldStore::new_in_memory().await.unwrap();
        FieldService::new(Arc::new(store), 16)
    }

    fn new_field(name: &str, field_type: FieldType, config: Value) -> NewCustomField {
        NewCustomField {
            name: name.to_string(),
            field_type,
            config,
        }
    }

    async fn rating(svc: &FieldService, list: ListId, name: &str) -> CustomField {
        svc.create_field(list, new_field(name, FieldType::Rating, json!({ "max_rating": 5 })))
            .await
            .unwrap()
    }

    fn schema_request(fields: Vec<SchemaFieldInput>) -> NewFieldSchema {
        NewFieldSchema {
            name: "Review".to_string(),
            description: None,
            fields,
        }
    }

    #[tokio::test]
    async fn test_create_field_rejects_case_insensitive_duplicate() {
        let svc = service().await;
        let list = ListId::new();
        rating(&svc, list, "Quality").await;

        let err = svc
            .create_field(list, new_field("quality", FieldType::Boolean, json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Same name in another list is fine
        rating(&svc, ListId::new(), "Quality").await;
        assert!(svc.check_duplicate_name(list, "QUALITY").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_field_rejects_mismatched_config() {
        let svc = service().await;
        let err = svc
            .create_field(
                ListId::new(),
                new_field("Stars", FieldType::Rating, json!({ "options": ["a"] })),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_field_type_is_immutable() {
        let svc = service().await;
        let field = rating(&svc, ListId::new(), "Stars").await;

        let err = svc
            .update_field(
                field.id,
                CustomFieldUpdate {
                    field_type: Some(FieldType::Text),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let updated = svc
            .update_field(
                field.id,
                CustomFieldUpdate {
                    name: Some("Score".into()),
                    config: Some(json!({ "max_rating": 10 })),
                    field_type: Some(FieldType::Rating),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Score");
        assert_eq!(svc.get_field(field.id).await.unwrap().name, "Score");
    }

    #[tokio::test]
    async fn test_bound_field_cannot_be_deleted() {
        let svc = service().await;
        let list = ListId::new();
        let field = rating(&svc, list, "Stars").await;
        let schema = svc
            .create_schema(
                list,
                schema_request(vec![SchemaFieldInput {
                    field_id: field.id,
                    display_order: 0,
                    show_on_card: true,
                }]),
            )
            .await
            .unwrap();

        assert!(matches!(svc.delete_field(field.id).await, Err(AppError::Conflict(_))));
        svc.remove_schema_field(schema.id, field.id).await.unwrap();
        svc.delete_field(field.id).await.unwrap();
        assert!(matches!(svc.get_field(field.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fourth_card_binding_is_rejected() {
        let svc = service().await;
        let list = ListId::new();
        let mut inputs = Vec::new();
        for i in 0..MAX_SHOW_ON_CARD {
            let f = rating(&svc, list, &format!("F{}", i)).await;
            inputs.push(SchemaFieldInput {
                field_id: f.id,
                display_order: i as i32,
                show_on_card: true,
            });
        }
        let schema = svc.create_schema(list, schema_request(inputs)).await.unwrap();
        let extra = rating(&svc, list, "Extra").await;

        let err = svc
            .add_schema_field(
                schema.id,
                NewSchemaField {
                    field_id: extra.id,
                    display_order: None,
                    show_on_card: true,
                },
            )
            .await
            .unwrap_err();
        match err {
            AppError::SchemaViolations(v) => assert_eq!(v[0].rule, ViolationRule::ShowOnCardLimit),
            other => panic!("unexpected error {:?}", other),
        }

        let added = svc
            .add_schema_field(
                schema.id,
                NewSchemaField {
                    field_id: extra.id,
                    display_order: None,
                    show_on_card: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(added.binding(extra.id).unwrap().display_order, 3);
    }

    #[tokio::test]
    async fn test_schema_with_unknown_field_is_not_found() {
        let svc = service().await;
        let err = svc
            .create_schema(
                ListId::new(),
                schema_request(vec![SchemaFieldInput {
                    field_id: FieldId::new(),
                    display_order: 0,
                    show_on_card: false,
                }]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_schema_bound_to_tag_cannot_be_deleted() {
        let svc = service().await;
        let list = ListId::new();
        let schema = svc.create_schema(list, schema_request(vec![])).await.unwrap();
        let tag = svc
            .create_tag(
                list,
                NewTag {
                    name: "Music".into(),
                    schema_id: Some(schema.id),
                },
            )
            .await
            .unwrap();

        assert!(matches!(svc.delete_schema(schema.id).await, Err(AppError::Conflict(_))));
        svc.set_tag_schema(tag.id, None).await.unwrap();
        svc.delete_schema(schema.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_update_reports_partial_failure() {
        let svc = service().await;
        let list = ListId::new();
        let stars = rating(&svc, list, "Stars").await;
        let notes = svc
            .create_field(list, new_field("Notes", FieldType::Text, json!({ "max_length": 5 })))
            .await
            .unwrap();
        let unbound = rating(&svc, list, "Unbound").await;
        let schema = svc
            .create_schema(
                list,
                schema_request(vec![
                    SchemaFieldInput { field_id: stars.id, display_order: 0, show_on_card: true },
                    SchemaFieldInput { field_id: notes.id, display_order: 1, show_on_card: false },
                ]),
            )
            .await
            .unwrap();
        let tag = svc
            .create_tag(list, NewTag { name: "Review".into(), schema_id: Some(schema.id) })
            .await
            .unwrap();
        let video = svc
            .create_video(
                list,
                NewVideo { youtube_url: "https://youtu.be/x".into(), title: None },
            )
            .await
            .unwrap();
        svc.tag_video(video.id, tag.id).await.unwrap();

        let ghost = FieldId::new();
        let response = svc
            .batch_update_values(
                video.id,
                vec![
                    FieldValueUpdate { field_id: stars.id, value: json!(4) },
                    FieldValueUpdate { field_id: notes.id, value: json!("too long") },
                    FieldValueUpdate { field_id: unbound.id, value: json!(1) },
                    FieldValueUpdate { field_id: ghost, value: json!(1) },
                ],
            )
            .await
            .unwrap();

        assert_eq!(response.updated.len(), 1);
        assert_eq!(response.updated[0].value, Some(FieldValue::Number(4.0)));
        assert_eq!(response.updated[0].field_name, "Stars");
        assert_eq!(response.errors.len(), 3);
        assert_eq!(
            response.error_for(ghost).unwrap().kind,
            FieldUpdateErrorKind::NotFound
        );
        assert_eq!(
            response.error_for(unbound.id).unwrap().kind,
            FieldUpdateErrorKind::Validation
        );

        let views = svc.video_fields(video.id).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].value, Some(FieldValue::Number(4.0)));
        assert_eq!(views[1].value, None);
    }

    #[tokio::test]
    async fn test_storage_failure_fails_only_its_entry() {
        let store = Arc::new(SqliteFieldStore::new_in_memory().await.unwrap());
        let svc = FieldService::new(store.clone(), 16);
        let list = ListId::new();
        let stars = rating(&svc, list, "Stars").await;
        let flag = svc
            .create_field(list, new_field("Watched", FieldType::Boolean, json!({})))
            .await
            .unwrap();
        let schema = svc
            .create_schema(
                list,
                schema_request(vec![
                    SchemaFieldInput { field_id: stars.id, display_order: 0, show_on_card: true },
                    SchemaFieldInput { field_id: flag.id, display_order: 1, show_on_card: false },
                ]),
            )
            .await
            .unwrap();
        let tag = svc
            .create_tag(list, NewTag { name: "t".into(), schema_id: Some(schema.id) })
            .await
            .unwrap();
        let video = svc
            .create_video(list, NewVideo { youtube_url: "u".into(), title: None })
            .await
            .unwrap();
        svc.tag_video(video.id, tag.id).await.unwrap();

        sqlx::query(&format!(
            "CREATE TRIGGER reject_flag BEFORE INSERT ON video_field_values
             WHEN NEW.field_id = '{}' BEGIN SELECT RAISE(ABORT, 'disk full'); END",
            flag.id
        ))
        .execute(store.pool())
        .await
        .unwrap();

        let response = svc
            .batch_update_values(
                video.id,
                vec![
                    FieldValueUpdate { field_id: stars.id, value: json!(3) },
                    FieldValueUpdate { field_id: flag.id, value: json!(true) },
                ],
            )
            .await
            .unwrap();

        assert_eq!(response.updated.len(), 1);
        assert!(response.updated_for(stars.id).is_some());
        assert_eq!(response.error_for(flag.id).unwrap().kind, FieldUpdateErrorKind::Storage);

        let views = svc.video_fields(video.id).await.unwrap();
        assert_eq!(views[0].value, Some(FieldValue::Number(3.0)));
        assert_eq!(views[1].value, None);
    }

    #[tokio::test]
    async fn test_append_after_max_display_order_is_rejected() {
        let svc = service().await;
        let list = ListId::new();
        let last = rating(&svc, list, "Last").await;
        let extra = rating(&svc, list, "Extra").await;
        let schema = svc
            .create_schema(
                list,
                schema_request(vec![SchemaFieldInput {
                    field_id: last.id,
                    display_order: i32::MAX,
                    show_on_card: false,
                }]),
            )
            .await
            .unwrap();

        let err = svc
            .add_schema_field(
                schema.id,
                NewSchemaField { field_id: extra.id, display_order: None, show_on_card: false },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let added = svc
            .add_schema_field(
                schema.id,
                NewSchemaField { field_id: extra.id, display_order: Some(0), show_on_card: false },
            )
            .await
            .unwrap();
        assert_eq!(added.schema_fields.len(), 2);
    }

    #[tokio::test]
    async fn test_null_clears_value() {
        let svc = service().await;
        let list = ListId::new();
        let flag = svc
            .create_field(list, new_field("Watched", FieldType::Boolean, json!({})))
            .await
            .unwrap();
        let schema = svc
            .create_schema(
                list,
                schema_request(vec![SchemaFieldInput {
                    field_id: flag.id,
                    display_order: 0,
                    show_on_card: false,
                }]),
            )
            .await
            .unwrap();
        let tag = svc
            .create_tag(list, NewTag { name: "t".into(), schema_id: Some(schema.id) })
            .await
            .unwrap();
        let video = svc
            .create_video(list, NewVideo { youtube_url: "u".into(), title: None })
            .await
            .unwrap();
        svc.tag_video(video.id, tag.id).await.unwrap();

        svc.batch_update_values(video.id, vec![FieldValueUpdate { field_id: flag.id, value: json!(true) }])
            .await
            .unwrap();
        svc.batch_update_values(video.id, vec![FieldValueUpdate { field_id: flag.id, value: Value::Null }])
            .await
            .unwrap();
        assert_eq!(svc.video_fields(video.id).await.unwrap()[0].value, None);
    }

    #[tokio::test]
    async fn test_atomic_reorder_through_binding_mutator() {
        let svc = service().await;
        let list = ListId::new();
        let a = rating(&svc, list, "A").await;
        let b = rating(&svc, list, "B").await;
        let schema = svc
            .create_schema(
                list,
                schema_request(vec![
                    SchemaFieldInput { field_id: a.id, display_order: 0, show_on_card: false },
                    SchemaFieldInput { field_id: b.id, display_order: 1, show_on_card: false },
                ]),
            )
            .await
            .unwrap();

        let report = crate::schemas::apply_reorder(
            &svc,
            schema.id,
            &[
                ReorderEntry { field_id: a.id, display_order: 1 },
                ReorderEntry { field_id: b.id, display_order: 0 },
            ],
        )
        .await
        .unwrap();
        assert!(report.is_complete());
        let reloaded = svc.get_schema(schema.id).await.unwrap();
        assert_eq!(reloaded.schema_fields[0].field_id, b.id);
    }
}
