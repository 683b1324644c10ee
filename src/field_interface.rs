// Field interface - HTTP routes for custom fields, schemas, tags and values

use std::sync::Arc;
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    core::{FieldId, ListId, SchemaId, TagId, VideoId},
    error::AppResult,
    fields::{CustomField, CustomFieldUpdate, NewCustomField},
    schemas::{
        apply_reorder, FieldSchema, FieldSchemaUpdate, NewFieldSchema, NewSchemaField, NewTag,
        ReorderEntry, SchemaFieldUpdate, Tag,
    },
    services::FieldService,
    videos::{BatchUpdateRequest, BatchUpdateResponse, NewVideo, Video, VideoFieldView},
};

type Service = State<Arc<FieldService>>;

#[derive(Deserialize)]
pub struct DuplicateNameQuery {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub fields: Vec<ReorderEntry>,
}

#[derive(Deserialize)]
pub struct TagSchemaRequest {
    pub schema_id: Option<SchemaId>,
}

#[derive(Deserialize)]
pub struct TagVideoRequest {
    pub tag_id: TagId,
}

// Custom fields

pub async fn create_field_handler(
    State(service): Service,
    AxumPath(list_id): AxumPath<ListId>,
    Json(req): Json<NewCustomField>,
) -> AppResult<(StatusCode, Json<CustomField>)> {
    let field = service.create_field(list_id, req).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

pub async fn list_fields_handler(
    State(service): Service,
    AxumPath(list_id): AxumPath<ListId>,
) -> AppResult<Json<Vec<CustomField>>> {
    Ok(Json(service.list_fields(list_id).await?))
}

pub async fn check_duplicate_handler(
    State(service): Service,
    AxumPath(list_id): AxumPath<ListId>,
    Json(req): Json<DuplicateNameQuery>,
) -> AppResult<Json<Value>> {
    let existing = service.check_duplicate_name(list_id, &req.name).await?;
    Ok(Json(json!({
        "exists": existing.is_some(),
        "field": existing,
    })))
}

pub async fn get_field_handler(
    State(service): Service,
    AxumPath(id): AxumPath<FieldId>,
) -> AppResult<Json<CustomField>> {
    Ok(Json(service.get_field(id).await?))
}

pub async fn update_field_handler(
    State(service): Service,
    AxumPath(id): AxumPath<FieldId>,
    Json(req): Json<CustomFieldUpdate>,
) -> AppResult<Json<CustomField>> {
    Ok(Json(service.update_field(id, req).await?))
}

pub async fn delete_field_handler(
    State(service): Service,
    AxumPath(id): AxumPath<FieldId>,
) -> AppResult<StatusCode> {
    service.delete_field(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Schemas

pub async fn create_schema_handler(
    State(service): Service,
    AxumPath(list_id): AxumPath<ListId>,
    Json(req): Json<NewFieldSchema>,
) -> AppResult<(StatusCode, Json<FieldSchema>)> {
    let schema = service.create_schema(list_id, req).await?;
    Ok((StatusCode::CREATED, Json(schema)))
}

pub async fn list_schemas_handler(
    State(service): Service,
    AxumPath(list_id): AxumPath<ListId>,
) -> AppResult<Json<Vec<FieldSchema>>> {
    Ok(Json(service.list_schemas(list_id).await?))
}

pub async fn get_schema_handler(
    State(service): Service,
    AxumPath(id): AxumPath<SchemaId>,
) -> AppResult<Json<FieldSchema>> {
    Ok(Json(service.get_schema(id).await?))
}

pub async fn update_schema_handler(
    State(service): Service,
    AxumPath(id): AxumPath<SchemaId>,
    Json(req): Json<FieldSchemaUpdate>,
) -> AppResult<Json<FieldSchema>> {
    Ok(Json(service.update_schema(id, req).await?))
}

pub async fn delete_schema_handler(
    State(service): Service,
    AxumPath(id): AxumPath<SchemaId>,
) -> AppResult<StatusCode> {
    service.delete_schema(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_schema_field_handler(
    State(service): Service,
    AxumPath(id): AxumPath<SchemaId>,
    Json(req): Json<NewSchemaField>,
) -> AppResult<(StatusCode, Json<FieldSchema>)> {
    let schema = service.add_schema_field(id, req).await?;
    Ok((StatusCode::CREATED, Json(schema)))
}

pub async fn reorder_schema_fields_handler(
    State(service): Service,
    AxumPath(id): AxumPath<SchemaId>,
    Json(req): Json<ReorderRequest>,
) -> AppResult<Json<Value>> {
    let report = apply_reorder(service.as_ref(), id, &req.fields).await?;
    let schema = service.get_schema(id).await?;
    Ok(Json(json!({
        "report": report,
        "schema": schema,
    })))
}

pub async fn update_schema_field_handler(
    State(service): Service,
    AxumPath((id, field_id)): AxumPath<(SchemaId, FieldId)>,
    Json(req): Json<SchemaFieldUpdate>,
) -> AppResult<Json<FieldSchema>> {
    Ok(Json(service.update_schema_field(id, field_id, req).await?))
}

pub async fn remove_schema_field_handler(
    State(service): Service,
    AxumPath((id, field_id)): AxumPath<(SchemaId, FieldId)>,
) -> AppResult<Json<FieldSchema>> {
    Ok(Json(service.remove_schema_field(id, field_id).await?))
}

// Tags and videos

pub async fn create_tag_handler(
    State(service): Service,
    AxumPath(list_id): AxumPath<ListId>,
    Json(req): Json<NewTag>,
) -> AppResult<(StatusCode, Json<Tag>)> {
    let tag = service.create_tag(list_id, req).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn set_tag_schema_handler(
    State(service): Service,
    AxumPath(id): AxumPath<TagId>,
    Json(req): Json<TagSchemaRequest>,
) -> AppResult<Json<Tag>> {
    Ok(Json(service.set_tag_schema(id, req.schema_id).await?))
}

pub async fn create_video_handler(
    State(service): Service,
    AxumPath(list_id): AxumPath<ListId>,
    Json(req): Json<NewVideo>,
) -> AppResult<(StatusCode, Json<Video>)> {
    let video = service.create_video(list_id, req).await?;
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn tag_video_handler(
    State(service): Service,
    AxumPath(id): AxumPath<VideoId>,
    Json(req): Json<TagVideoRequest>,
) -> AppResult<Json<Vec<Tag>>> {
    Ok(Json(service.tag_video(id, req.tag_id).await?))
}

pub async fn video_fields_handler(
    State(service): Service,
    AxumPath(id): AxumPath<VideoId>,
) -> AppResult<Json<Vec<VideoFieldView>>> {
    Ok(Json(service.video_fields(id).await?))
}

pub async fn batch_update_values_handler(
    State(service): Service,
    AxumPath(id): AxumPath<VideoId>,
    Json(req): Json<BatchUpdateRequest>,
) -> AppResult<Json<BatchUpdateResponse>> {
    Ok(Json(service.batch_update_values(id, req.updates).await?))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_field_router(service: Arc<FieldService>) -> Router {
    Router::new()
        // Custom fields
        .route("/lists/{list_id}/custom-fields", post(create_field_handler).get(list_fields_handler))
        .route("/lists/{list_id}/custom-fields/check-duplicate", post(check_duplicate_handler))
        .route(
            "/custom-fields/{id}",
            get(get_field_handler).put(update_field_handler).delete(delete_field_handler),
        )

        // Schemas and bindings
        .route("/lists/{list_id}/schemas", post(create_schema_handler).get(list_schemas_handler))
        .route(
            "/schemas/{id}",
            get(get_schema_handler).put(update_schema_handler).delete(delete_schema_handler),
        )
        .route(
            "/schemas/{id}/fields",
            post(add_schema_field_handler).put(reorder_schema_fields_handler),
        )
        .route(
            "/schemas/{id}/fields/{field_id}",
            put(update_schema_field_handler).delete(remove_schema_field_handler),
        )

        // Tags, videos and values
        .route("/lists/{list_id}/tags", post(create_tag_handler))
        .route("/tags/{id}/schema", put(set_tag_schema_handler))
        .route("/lists/{list_id}/videos", post(create_video_handler))
        .route("/videos/{id}/tags", post(tag_video_handler))
        .route(
            "/videos/{id}/fields",
            get(video_fields_handler).put(batch_update_values_handler),
        )

        .route("/health", get(health_handler))
        .with_state(service)
}
