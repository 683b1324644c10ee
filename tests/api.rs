use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use video_fields::{
    field_interface::create_field_router, infrastructure::SqliteFieldStore,
    services::FieldService,
};

async fn app() -> Router {
    let store = SqliteFieldStore::new_in_memory().await.unwrap();
    let service = Arc::new(FieldService::new(Arc::new(store), 64));
    Router::new().nest("/api/v1", create_field_router(service))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

const LIST: &str = "5b0e4c0a-6f7e-4c3c-9a51-0f8f6a3c2d11";

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_field_crud_and_duplicate_check() {
    let app = app().await;
    let (status, field) = call(
        &app,
        Method::POST,
        &format!("/api/v1/lists/{}/custom-fields", LIST),
        Some(json!({ "name": "Mood", "field_type": "select", "config": { "options": ["calm", "upbeat"] } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(field["field_type"], "select");
    let id = field["id"].as_str().unwrap().to_string();

    let (status, check) = call(
        &app,
        Method::POST,
        &format!("/api/v1/lists/{}/custom-fields/check-duplicate", LIST),
        Some(json!({ "name": "MOOD" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["exists"], true);
    assert_eq!(check["field"]["id"], id.as_str());

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/lists/{}/custom-fields", LIST),
        Some(json!({ "name": "mood", "field_type": "boolean" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/custom-fields/{}", id),
        Some(json!({ "config": { "options": ["calm", "upbeat", "dark"] } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["config"]["options"].as_array().unwrap().len(), 3);

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/custom-fields/{}", id),
        Some(json!({ "field_type": "text" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = call(&app, Method::GET, &format!("/api/v1/lists/{}/custom-fields", LIST), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/custom-fields/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, &format!("/api/v1/custom-fields/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_config_is_unprocessable_with_details() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/lists/{}/custom-fields", LIST),
        Some(json!({ "name": "Stars", "field_type": "rating", "config": { "max_rating": 11 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["location"], "config.max_rating");
}

#[tokio::test]
async fn test_schema_violations_are_reported_per_binding() {
    let app = app().await;
    let mut ids = Vec::new();
    for name in ["A", "B"] {
        let (_, field) = call(
            &app,
            Method::POST,
            &format!("/api/v1/lists/{}/custom-fields", LIST),
            Some(json!({ "name": name, "field_type": "boolean", "config": {} })),
        )
        .await;
        ids.push(field["id"].as_str().unwrap().to_string());
    }

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/lists/{}/schemas", LIST),
        Some(json!({
            "name": "Broken",
            "fields": [
                { "field_id": ids[0], "display_order": 0 },
                { "field_id": ids[1], "display_order": 0 },
                { "field_id": ids[0], "display_order": 1 },
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert!(details.iter().all(|v| v["location"]["kind"] == "binding"));
}

#[tokio::test]
async fn test_reorder_and_values_round_trip() {
    let app = app().await;
    let fields = format!("/api/v1/lists/{}/custom-fields", LIST);
    let (_, stars) = call(&app, Method::POST, &fields, Some(json!({ "name": "Stars", "field_type": "rating", "config": { "max_rating": 5 } }))).await;
    let (_, notes) = call(&app, Method::POST, &fields, Some(json!({ "name": "Notes", "field_type": "text", "config": { "max_length": 10 } }))).await;

    let (status, schema) = call(
        &app,
        Method::POST,
        &format!("/api/v1/lists/{}/schemas", LIST),
        Some(json!({
            "name": "Review",
            "description": "How good was it",
            "fields": [
                { "field_id": stars["id"], "display_order": 0, "show_on_card": true },
                { "field_id": notes["id"], "display_order": 1 },
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let schema_id = schema["id"].as_str().unwrap().to_string();

    let (status, reordered) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/schemas/{}/fields", schema_id),
        Some(json!({ "fields": [
            { "field_id": stars["id"], "display_order": 1 },
            { "field_id": notes["id"], "display_order": 0 },
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reordered["report"]["mode"], "atomic");
    assert_eq!(reordered["schema"]["schema_fields"][0]["field_id"], notes["id"]);

    let (_, tag) = call(
        &app,
        Method::POST,
        &format!("/api/v1/lists/{}/tags", LIST),
        Some(json!({ "name": "Reviewed", "schema_id": schema_id })),
    )
    .await;
    let (status, video) = call(
        &app,
        Method::POST,
        &format!("/api/v1/lists/{}/videos", LIST),
        Some(json!({ "youtube_url": "https://www.youtube.com/watch?v=abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let video_id = video["id"].as_str().unwrap().to_string();
    let (status, tags) = call(
        &app,
        Method::POST,
        &format!("/api/v1/videos/{}/tags", video_id),
        Some(json!({ "tag_id": tag["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags.as_array().unwrap().len(), 1);

    let (status, batch) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/videos/{}/fields", video_id),
        Some(json!({ "updates": [
            { "field_id": stars["id"], "value": 4 },
            { "field_id": notes["id"], "value": "far too long for ten" },
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(batch["updated"].as_array().unwrap().len(), 1);
    assert_eq!(batch["updated"][0]["field_name"], "Stars");
    assert_eq!(batch["errors"][0]["kind"], "validation");

    let (status, view) = call(&app, Method::GET, &format!("/api/v1/videos/{}/fields", video_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let view = view.as_array().unwrap();
    assert_eq!(view.len(), 2);
    assert_eq!(view[0]["field"]["name"], "Notes");
    assert_eq!(view[0]["value"], Value::Null);
    assert_eq!(view[1]["value"], 4.0);

    // Schema is still bound to the tag
    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/schemas/{}", schema_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, tag) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/tags/{}/schema", tag["id"].as_str().unwrap()),
        Some(json!({ "schema_id": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag["schema_id"], Value::Null);
    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/schemas/{}", schema_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/videos/{}/fields", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}
