use std::sync::Arc;
use tracing::info;

use crate::{
    autosave::AutoSaveCoordinator,
    config::Config,
    infrastructure::SqliteFieldStore,
    services::FieldService,
};

#[derive(Clone)]
pub struct AppState {
    pub field_service: Arc<FieldService>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Connecting creates any missing tables
        let store = SqliteFieldStore::connect(&config.database.url).await?;
        info!("Database ready at {}", config.database.url);

        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: SqliteFieldStore, config: Config) -> Self {
        let field_service = Arc::new(FieldService::new(
            Arc::new(store),
            config.cache.field_capacity,
        ));

        Self {
            field_service,
            config,
        }
    }

    /// Auto-save for a client embedding the service in-process, writing
    /// straight to it with the configured debounce. HTTP clients debounce on
    /// their side and call the batch update route instead.
    pub fn autosave(&self) -> AutoSaveCoordinator<FieldService> {
        AutoSaveCoordinator::new(self.field_service.clone(), self.config.autosave.debounce())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ListId;
    use crate::fields::{FieldType, NewCustomField};
    use crate::videos::NewVideo;

    #[tokio::test]
    async fn test_state_wires_service_and_autosave() {
        let store = SqliteFieldStore::new_in_memory().await.unwrap();
        let mut config = Config::default();
        config.autosave.debounce_ms = 20;
        let state = AppState::with_store(store, config);

        let field = state
            .field_service
            .create_field(
                ListId::new(),
                NewCustomField {
                    name: "Watched".into(),
                    field_type: FieldType::Boolean,
                    config: serde_json::json!({}),
                },
            )
            .await
            .unwrap();
        assert_eq!(state.field_service.get_field(field.id).await.unwrap().name, "Watched");

        let video = state
            .field_service
            .create_video(ListId::new(), NewVideo { youtube_url: "u".into(), title: None })
            .await
            .unwrap();
        let saver = state.autosave();
        assert_eq!(saver.debounce().as_millis(), 20);
        saver.track(video.id, field.id, None);
        assert!(saver.snapshot(video.id, field.id).is_some());
        saver.shutdown();
    }
}
