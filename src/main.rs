//! Junimo Store catalog service

use anyhow::{Context, Result};
use junimo_store::{api::{self, AppState}, config::Config, events::EventPublisher, repository::{CatalogRepository, MemoryStore, PgStore}, service::NewProduct, CatalogService, CodeAllocator};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let repo: Arc<dyn CatalogRepository> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections).await.context("connecting to DATABASE_URL")?;
            store.migrate().await.context("running migrations")?;
            Arc::new(store)
        }
        None => { tracing::warn!("DATABASE_URL not set; catalog is in memory and will not survive restarts"); Arc::new(MemoryStore::new()) }
    };
    let publisher = EventPublisher::connect(config.nats_url.as_deref()).await;
    let catalog = CatalogService::new(repo, CodeAllocator::new(config.known_prefixes.clone()), publisher);

    if let Some(path) = &config.seed_path {
        let raw = tokio::fs::read_to_string(path).await.with_context(|| format!("reading seed file {}", path.display()))?;
        let fixtures: Vec<NewProduct> = serde_json::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))?;
        catalog.seed(fixtures).await?;
    }

    let app = api::router(AppState { catalog: Arc::new(catalog) }).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, "junimo-store listening");
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
