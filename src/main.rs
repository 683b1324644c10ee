// Video Fields Server - custom field and schema management API

use axum::Router;
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_fields::{
    app_state::AppState,
    config::Config,
    field_interface::create_field_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    ensure_database_dir(&config.database.url)?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    let app = Router::new()
        .nest("/api/v1", create_field_router(app_state.field_service.clone()))
        .layer(CorsLayer::permissive());

    let addr = config.server_address();
    info!("Video fields server starting on http://{}", addr);
    info!("  /api/v1/lists/{{list_id}}/custom-fields   - Custom fields");
    info!("  /api/v1/lists/{{list_id}}/schemas         - Field schemas");
    info!("  /api/v1/videos/{{id}}/fields              - Video field values");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

/// SQLite creates the file but not its parent directory
fn ensure_database_dir(url: &str) -> anyhow::Result<()> {
    let Some(path) = url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.trim_start_matches("//");
    if path.contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
