//! Catalog server: reads settings from the environment (and `.env`), prepares storage, serves HTTP.

use catalog::{
    app, apply_migrations, ensure_database_exists, AppState, CatalogStore, MemoryCatalogStore, PgCatalogStore,
    Settings, StorageKind,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catalog=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let store: Arc<dyn CatalogStore> = match settings.storage {
        StorageKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            apply_migrations(&pool).await?;
            Arc::new(PgCatalogStore::new(pool))
        }
        StorageKind::Memory => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            Arc::new(MemoryCatalogStore::new())
        }
    };

    tokio::fs::create_dir_all(&settings.media_root).await?;
    let state = AppState::new(store, &settings);
    let router = app(state, settings.max_upload_bytes);

    let listener = TcpListener::bind(settings.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
