use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use welfare_compass::{
    api::start_server,
    catalog::CatalogCache,
    config::AppConfig,
    conversational::Compass,
    extractor::{GeminiExtractor, ProfileExtractor},
    responder::{GeminiResponder, ReplyGenerator},
    state::InMemorySessionStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("🧭 Welfare Compass - API Server");
    info!("📍 Port: {}", config.port);

    let catalog = Arc::new(CatalogCache::new(config.catalog_candidates()));
    let loaded = catalog.get().await;
    match loaded.source.as_ref() {
        Some(path) => info!(programs = loaded.len(), path = %path.display(), "📚 Catalog loaded"),
        None => warn!("Catalog unavailable; chat turns will report missing data until reload"),
    }

    let compass = match config.gemini_api_key.clone() {
        Some(api_key) => {
            let extractor: Arc<dyn ProfileExtractor> = Arc::new(GeminiExtractor::new(
                api_key.clone(),
                config.extraction_model.clone(),
            )?);
            let responder: Arc<dyn ReplyGenerator> = Arc::new(GeminiResponder::new(
                api_key,
                config.generation_model.clone(),
            )?);
            info!(model = %config.generation_model, "✅ Gemini collaborators initialized");
            Compass::new(catalog, extractor, responder)
        }
        None => {
            eprintln!("⚠️  GEMINI_API_KEY not set in .env");
            eprintln!("📌 Falling back to rule-based extraction and replies");
            Compass::offline(catalog)
        }
    };

    info!("📡 Starting API server...");

    start_server(Arc::new(compass), Arc::new(InMemorySessionStore::new()), config.port).await?;

    Ok(())
}
