mod analysis;
mod config;
mod db;
mod errors;
mod fitter;
mod generation;
mod llm_client;
mod rag;
mod render;
mod routes;
mod state;
mod widgets;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::relevance::KeywordRelevanceScorer;
use crate::config::Config;
use crate::db::create_pool;
use crate::generation::cache::RedisGenerationCache;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Crush API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis-backed generation cache
    let redis = redis::Client::open(config.redis_url.clone())?;
    let generation_cache = Arc::new(RedisGenerationCache::new(redis));
    info!("Redis generation cache initialized");

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize relevance scorer (keyword backend by default)
    let relevance_scorer = Arc::new(KeywordRelevanceScorer);

    // Build app state
    let state = AppState {
        db,
        llm,
        config: config.clone(),
        relevance_scorer,
        generation_cache,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
