use std::sync::Arc;

use sqlx::PgPool;

use crate::analysis::relevance::RelevanceScorer;
use crate::config::Config;
use crate::generation::cache::GenerationCache;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub config: Config,
    /// Pluggable relevance scorer. Default: KeywordRelevanceScorer.
    pub relevance_scorer: Arc<dyn RelevanceScorer>,
    /// Idempotency cache for CV generations. Redis in production.
    pub generation_cache: Arc<dyn GenerationCache>,
}
