use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::core::{FieldId, ListId, SchemaId, TagId, ValueId, VideoId};
use crate::error::{AppError, AppResult};
use crate::fields::{validate_config, CustomField, FieldType, FieldValue, VideoFieldValue};
use crate::infrastructure::database::FieldStore;
use crate::schemas::{FieldSchema, SchemaField, Tag};
use crate::videos::Video;

/// SQLite implementation of the field store
pub struct SqliteFieldStore {
    pool: SqlitePool,
}

impl SqliteFieldStore {
    /// Connect to `url` (e.g. `sqlite:data/video_fields.db` or `sqlite::memory:`)
    /// and create missing tables
    pub async fn connect(url: &str) -> AppResult<Self> {
        let in_memory = url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid database URL {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own empty database,
        // so the pool is pinned to a single connection that never expires
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e))
        })?;

        let db = Self { pool };
        db.initialize().await?;
        info!("Field store ready at {}", url);
        Ok(db)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    async fn initialize(&self) -> AppResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS custom_fields (
                id TEXT PRIMARY KEY,
                list_id TEXT NOT NULL,
                name TEXT NOT NULL,
                field_type TEXT NOT NULL,
                config TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_custom_fields_list ON custom_fields(list_id)",
            r#"
            CREATE TABLE IF NOT EXISTS field_schemas (
                id TEXT PRIMARY KEY,
                list_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS schema_fields (
                schema_id TEXT NOT NULL REFERENCES field_schemas(id) ON DELETE CASCADE,
                field_id TEXT NOT NULL REFERENCES custom_fields(id),
                display_order INTEGER NOT NULL,
                show_on_card INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (schema_id, field_id),
                UNIQUE (schema_id, display_order)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_schema_fields_field ON schema_fields(field_id)",
            r#"
            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                list_id TEXT NOT NULL,
                name TEXT NOT NULL,
                schema_id TEXT REFERENCES field_schemas(id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id TEXT PRIMARY KEY,
                list_id TEXT NOT NULL,
                youtube_url TEXT NOT NULL,
                title TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS video_tags (
                video_id TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                tag_id TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (video_id, tag_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS video_field_values (
                id TEXT PRIMARY KEY,
                video_id TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                field_id TEXT NOT NULL REFERENCES custom_fields(id),
                value_text TEXT,
                value_numeric REAL,
                value_boolean INTEGER,
                updated_at TEXT NOT NULL,
                UNIQUE (video_id, field_id)
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to initialize schema: {}", e)))?;
        }
        Ok(())
    }

    async fn load_bindings(&self, schema_id: SchemaId) -> AppResult<Vec<SchemaField>> {
        let rows = sqlx::query(
            "SELECT schema_id, field_id, display_order, show_on_card FROM schema_fields
             WHERE schema_id = ? ORDER BY display_order",
        )
        .bind(schema_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to load bindings of schema {}: {}", schema_id, e))
        })?;
        rows.iter().map(binding_from_row).collect()
    }
}

fn parse_id<T: FromStr<Err = String>>(row: &SqliteRow, column: &str) -> AppResult<T> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(AppError::DatabaseError)
}

fn field_from_row(row: &SqliteRow) -> AppResult<CustomField> {
    let raw_type: String = row.try_get("field_type")?;
    let field_type = FieldType::parse(&raw_type)
        .ok_or_else(|| AppError::DatabaseError(format!("Unknown stored field type '{}'", raw_type)))?;
    let raw_config: String = row.try_get("config")?;
    let config_json: serde_json::Value = serde_json::from_str(&raw_config)
        .map_err(|e| AppError::DatabaseError(format!("Corrupt field config: {}", e)))?;
    let config = validate_config(field_type, &config_json)
        .map_err(|e| AppError::DatabaseError(format!("Stored config no longer valid: {}", e)))?;

    Ok(CustomField {
        id: parse_id(row, "id")?,
        list_id: parse_id(row, "list_id")?,
        name: row.try_get("name")?,
        field_type,
        config,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn binding_from_row(row: &SqliteRow) -> AppResult<SchemaField> {
    Ok(SchemaField {
        schema_id: parse_id(row, "schema_id")?,
        field_id: parse_id(row, "field_id")?,
        display_order: row.try_get("display_order")?,
        show_on_card: row.try_get("show_on_card")?,
    })
}

fn schema_from_row(row: &SqliteRow, schema_fields: Vec<SchemaField>) -> AppResult<FieldSchema> {
    Ok(FieldSchema {
        id: parse_id(row, "id")?,
        list_id: parse_id(row, "list_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        schema_fields,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn tag_from_row(row: &SqliteRow) -> AppResult<Tag> {
    let schema_id: Option<String> = row.try_get("schema_id")?;
    Ok(Tag {
        id: parse_id(row, "id")?,
        list_id: parse_id(row, "list_id")?,
        name: row.try_get("name")?,
        schema_id: schema_id
            .map(|raw| raw.parse())
            .transpose()
            .map_err(AppError::DatabaseError)?,
    })
}

fn value_from_row(row: &SqliteRow) -> AppResult<VideoFieldValue> {
    Ok(VideoFieldValue {
        id: parse_id::<ValueId>(row, "id")?,
        video_id: parse_id(row, "video_id")?,
        field_id: parse_id(row, "field_id")?,
        value_text: row.try_get("value_text")?,
        value_numeric: row.try_get("value_numeric")?,
        value_boolean: row.try_get("value_boolean")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const FIELD_COLUMNS: &str = "id, list_id, name, field_type, config, created_at, updated_at";
const SCHEMA_COLUMNS: &str = "id, list_id, name, description, created_at, updated_at";
const VALUE_COLUMNS: &str =
    "id, video_id, field_id, value_text, value_numeric, value_boolean, updated_at";

#[async_trait]
impl FieldStore for SqliteFieldStore {
    async fn insert_field(&self, field: &CustomField) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO custom_fields (id, list_id, name, field_type, config, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(field.id.to_string())
        .bind(field.list_id.to_string())
        .bind(&field.name)
        .bind(field.field_type.as_str())
        .bind(field.config.to_json().to_string())
        .bind(field.created_at)
        .bind(field.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create field {}: {}", field.id, e)))?;
        Ok(())
    }

    async fn get_field(&self, id: FieldId) -> AppResult<Option<CustomField>> {
        let row = sqlx::query(&format!("SELECT {} FROM custom_fields WHERE id = ?", FIELD_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get field {}: {}", id, e)))?;
        row.as_ref().map(field_from_row).transpose()
    }

    async fn get_fields(&self, ids: &[FieldId]) -> AppResult<Vec<CustomField>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM custom_fields WHERE id IN (",
            FIELD_COLUMNS
        ));
        let mut separated = qb.separated(",");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        qb.push(")");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get fields: {}", e)))?;
        rows.iter().map(field_from_row).collect()
    }

    async fn list_fields(&self, list_id: ListId) -> AppResult<Vec<CustomField>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM custom_fields WHERE list_id = ? ORDER BY name",
            FIELD_COLUMNS
        ))
        .bind(list_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list fields of {}: {}", list_id, e)))?;
        rows.iter().map(field_from_row).collect()
    }

    async fn find_field_by_name(
        &self,
        list_id: ListId,
        name: &str,
    ) -> AppResult<Option<CustomField>> {
        // SQLite's NOCASE only folds ASCII, so compare in Rust
        let wanted = name.trim().to_lowercase();
        Ok(self
            .list_fields(list_id)
            .await?
            .into_iter()
            .find(|field| field.name.to_lowercase() == wanted))
    }

    async fn update_field(&self, field: &CustomField) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE custom_fields SET name = ?, config = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&field.name)
        .bind(field.config.to_json().to_string())
        .bind(field.updated_at)
        .bind(field.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update field {}: {}", field.id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Field {} not found", field.id)));
        }
        Ok(())
    }

    async fn delete_field(&self, id: FieldId) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM video_field_values WHERE field_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM custom_fields WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete field {}: {}", id, e)))?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_field_bindings(&self, id: FieldId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_fields WHERE field_id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn insert_schema(&self, schema: &FieldSchema) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO field_schemas (id, list_id, name, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(schema.id.to_string())
        .bind(schema.list_id.to_string())
        .bind(&schema.name)
        .bind(&schema.description)
        .bind(schema.created_at)
        .bind(schema.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create schema {}: {}", schema.id, e)))?;

        for binding in &schema.schema_fields {
            insert_binding(&mut tx, binding).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_schema(&self, id: SchemaId) -> AppResult<Option<FieldSchema>> {
        let row = sqlx::query(&format!("SELECT {} FROM field_schemas WHERE id = ?", SCHEMA_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get schema {}: {}", id, e)))?;

        match row {
            Some(row) => {
                let bindings = self.load_bindings(id).await?;
                Ok(Some(schema_from_row(&row, bindings)?))
            }
            None => Ok(None),
        }
    }

    async fn list_schemas(&self, list_id: ListId) -> AppResult<Vec<FieldSchema>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM field_schemas WHERE list_id = ? ORDER BY name",
            SCHEMA_COLUMNS
        ))
        .bind(list_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list schemas of {}: {}", list_id, e)))?;

        let binding_rows = sqlx::query(
            "SELECT sf.schema_id, sf.field_id, sf.display_order, sf.show_on_card
             FROM schema_fields sf JOIN field_schemas s ON s.id = sf.schema_id
             WHERE s.list_id = ? ORDER BY sf.display_order",
        )
        .bind(list_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<SchemaId, Vec<SchemaField>> = HashMap::new();
        for row in &binding_rows {
            let binding = binding_from_row(row)?;
            grouped.entry(binding.schema_id).or_default().push(binding);
        }

        rows.iter()
            .map(|row| {
                let id: SchemaId = parse_id(row, "id")?;
                schema_from_row(row, grouped.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn update_schema(&self, schema: &FieldSchema) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE field_schemas SET name = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&schema.name)
        .bind(&schema.description)
        .bind(schema.updated_at)
        .bind(schema.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update schema {}: {}", schema.id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Schema {} not found", schema.id)));
        }
        Ok(())
    }

    async fn replace_schema_fields(&self, id: SchemaId, bindings: &[SchemaField]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM schema_fields WHERE schema_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        for binding in bindings {
            insert_binding(&mut tx, binding).await?;
        }
        sqlx::query("UPDATE field_schemas SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to commit bindings of schema {}: {}", id, e))
        })?;
        Ok(())
    }

    async fn delete_schema(&self, id: SchemaId) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM schema_fields WHERE schema_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM field_schemas WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete schema {}: {}", id, e)))?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_schema_tags(&self, id: SchemaId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE schema_id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn insert_tag(&self, tag: &Tag) -> AppResult<()> {
        sqlx::query("INSERT INTO tags (id, list_id, name, schema_id) VALUES (?, ?, ?, ?)")
            .bind(tag.id.to_string())
            .bind(tag.list_id.to_string())
            .bind(&tag.name)
            .bind(tag.schema_id.map(|id| id.to_string()))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create tag {}: {}", tag.id, e)))?;
        Ok(())
    }

    async fn get_tag(&self, id: TagId) -> AppResult<Option<Tag>> {
        let row = sqlx::query("SELECT id, list_id, name, schema_id FROM tags WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(tag_from_row).transpose()
    }

    async fn set_tag_schema(&self, id: TagId, schema_id: Option<SchemaId>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE tags SET schema_id = ? WHERE id = ?")
            .bind(schema_id.map(|s| s.to_string()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to bind schema to tag {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_video(&self, video: &Video) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO videos (id, list_id, youtube_url, title, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(video.id.to_string())
        .bind(video.list_id.to_string())
        .bind(&video.youtube_url)
        .bind(&video.title)
        .bind(video.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create video {}: {}", video.id, e)))?;
        Ok(())
    }

    async fn get_video(&self, id: VideoId) -> AppResult<Option<Video>> {
        let row = sqlx::query(
            "SELECT id, list_id, youtube_url, title, created_at FROM videos WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Video {
                id: parse_id(&row, "id")?,
                list_id: parse_id(&row, "list_id")?,
                youtube_url: row.try_get("youtube_url")?,
                title: row.try_get("title")?,
                created_at: row.try_get("created_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn add_video_tag(&self, video_id: VideoId, tag_id: TagId) -> AppResult<()> {
        sqlx::query("INSERT OR IGNORE INTO video_tags (video_id, tag_id) VALUES (?, ?)")
            .bind(video_id.to_string())
            .bind(tag_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to tag video {} with {}: {}", video_id, tag_id, e))
            })?;
        Ok(())
    }

    async fn video_tags(&self, video_id: VideoId) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.list_id, t.name, t.schema_id FROM tags t
             JOIN video_tags vt ON vt.tag_id = t.id
             WHERE vt.video_id = ? ORDER BY t.name, t.id",
        )
        .bind(video_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(tag_from_row).collect()
    }

    async fn upsert_value(
        &self,
        video_id: VideoId,
        field_id: FieldId,
        value: &FieldValue,
    ) -> AppResult<VideoFieldValue> {
        let stored = VideoFieldValue::new(video_id, field_id, value);
        sqlx::query(
            "INSERT INTO video_field_values
                (id, video_id, field_id, value_text, value_numeric, value_boolean, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (video_id, field_id) DO UPDATE SET
                value_text = excluded.value_text,
                value_numeric = excluded.value_numeric,
                value_boolean = excluded.value_boolean,
                updated_at = excluded.updated_at",
        )
        .bind(stored.id.to_string())
        .bind(video_id.to_string())
        .bind(field_id.to_string())
        .bind(&stored.value_text)
        .bind(stored.value_numeric)
        .bind(stored.value_boolean)
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to store value of field {} on video {}: {}",
                field_id, video_id, e
            ))
        })?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM video_field_values WHERE video_id = ? AND field_id = ?",
            VALUE_COLUMNS
        ))
        .bind(video_id.to_string())
        .bind(field_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        value_from_row(&row)
    }

    async fn delete_value(&self, video_id: VideoId, field_id: FieldId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM video_field_values WHERE video_id = ? AND field_id = ?")
            .bind(video_id.to_string())
            .bind(field_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_values(&self, video_id: VideoId) -> AppResult<Vec<VideoFieldValue>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM video_field_values WHERE video_id = ?",
            VALUE_COLUMNS
        ))
        .bind(video_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(value_from_row).collect()
    }
}

async fn insert_binding(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    binding: &SchemaField,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO schema_fields (schema_id, field_id, display_order, show_on_card)
         VALUES (?, ?, ?, ?)",
    )
    .bind(binding.schema_id.to_string())
    .bind(binding.field_id.to_string())
    .bind(binding.display_order)
    .bind(binding.show_on_card)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        AppError::DatabaseError(format!(
            "Failed to bind field {} to schema {}: {}",
            binding.field_id, binding.schema_id, e
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldConfig;

    fn rating_field(list_id: ListId, name: &str) -> CustomField {
        CustomField::new(list_id, name.into(), FieldConfig::Rating { max_rating: 5 })
    }

    fn schema_with(list_id: ListId, fields: &[(FieldId, i32, bool)]) -> FieldSchema {
        let id = SchemaId::new();
        FieldSchema {
            id,
            list_id,
            name: "Review".into(),
            description: Some("How good was it".into()),
            schema_fields: fields
                .iter()
                .map(|&(field_id, display_order, show_on_card)| SchemaField {
                    schema_id: id,
                    field_id,
                    display_order,
                    show_on_card,
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_field_round_trip_and_case_insensitive_lookup() {
        let store = SqliteFieldStore::new_in_memory().await.unwrap();
        let list = ListId::new();
        let field = rating_field(list, "Overall Rating");
        store.insert_field(&field).await.unwrap();

        let loaded = store.get_field(field.id).await.unwrap().unwrap();
        assert_eq!(loaded.config, FieldConfig::Rating { max_rating: 5 });
        assert_eq!(loaded.name, "Overall Rating");

        let found = store.find_field_by_name(list, "overall rating").await.unwrap();
        assert_eq!(found.map(|f| f.id), Some(field.id));
        assert!(store
            .find_field_by_name(ListId::new(), "overall rating")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_schema_bindings_are_loaded_in_order() {
        let store = SqliteFieldStore::new_in_memory().await.unwrap();
        let list = ListId::new();
        let a = rating_field(list, "A");
        let b = rating_field(list, "B");
        store.insert_field(&a).await.unwrap();
        store.insert_field(&b).await.unwrap();

        let schema = schema_with(list, &[(a.id, 2, true), (b.id, 1, false)]);
        store.insert_schema(&schema).await.unwrap();

        let loaded = store.get_schema(schema.id).await.unwrap().unwrap();
        let order: Vec<_> = loaded.schema_fields.iter().map(|b| b.field_id).collect();
        assert_eq!(order, vec![b.id, a.id]);
        assert_eq!(store.count_field_bindings(a.id).await.unwrap(), 1);

        let listed = store.list_schemas(list).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].schema_fields.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_schema_fields_swaps_orders() {
        let store = SqliteFieldStore::new_in_memory().await.unwrap();
        let list = ListId::new();
        let a = rating_field(list, "A");
        let b = rating_field(list, "B");
        store.insert_field(&a).await.unwrap();
        store.insert_field(&b).await.unwrap();
        let schema = schema_with(list, &[(a.id, 0, false), (b.id, 1, false)]);
        store.insert_schema(&schema).await.unwrap();

        let swapped = schema_with(list, &[(a.id, 1, false), (b.id, 0, false)]).schema_fields;
        let rebound: Vec<_> = swapped
            .into_iter()
            .map(|mut binding| {
                binding.schema_id = schema.id;
                binding
            })
            .collect();
        store.replace_schema_fields(schema.id, &rebound).await.unwrap();

        let loaded = store.get_schema(schema.id).await.unwrap().unwrap();
        assert_eq!(loaded.schema_fields[0].field_id, b.id);
    }

    #[tokio::test]
    async fn test_value_upsert_keeps_identity_and_single_slot() {
        let store = SqliteFieldStore::new_in_memory().await.unwrap();
        let list = ListId::new();
        let field = rating_field(list, "Stars");
        store.insert_field(&field).await.unwrap();
        let video = Video {
            id: VideoId::new(),
            list_id: list,
            youtube_url: "https://youtu.be/abc".into(),
            title: None,
            created_at: Utc::now(),
        };
        store.insert_video(&video).await.unwrap();

        let first = store
            .upsert_value(video.id, field.id, &FieldValue::Number(3.0))
            .await
            .unwrap();
        let second = store
            .upsert_value(video.id, field.id, &FieldValue::Number(4.0))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.value_numeric, Some(4.0));
        assert!(second.value_text.is_none());
        assert!(second.updated_at >= first.updated_at);

        assert!(store.delete_value(video.id, field.id).await.unwrap());
        assert!(store.list_values(video.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_database_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("fields.db").display());
        let list = ListId::new();
        let field = rating_field(list, "Persisted");
        {
            let store = SqliteFieldStore::connect(&url).await.unwrap();
            store.insert_field(&field).await.unwrap();
        }

        let reopened = SqliteFieldStore::connect(&url).await.unwrap();
        reopened.health_check().await.unwrap();
        assert!(reopened.get_field(field.id).await.unwrap().is_some());
    }
}
