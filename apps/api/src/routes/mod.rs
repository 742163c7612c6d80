pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::generation::handlers as generation;
use crate::rag::handlers as rag;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // RAG profile API
        .route(
            "/api/v1/rag",
            get(rag::handle_get_rag)
                .put(rag::handle_put_rag)
                .delete(rag::handle_reset_rag),
        )
        .route("/api/v1/rag/ingest", post(rag::handle_ingest))
        .route("/api/v1/rag/dedup", post(rag::handle_dedup))
        .route("/api/v1/rag/quality", get(rag::handle_quality))
        .route("/api/v1/rag/weight", patch(rag::handle_cycle_weight))
        .route("/api/v1/rag/inferred", patch(rag::handle_review_inferred))
        // Job analysis API
        .route(
            "/api/v1/analyses",
            get(analysis::handle_list_analyses).post(analysis::handle_create_analysis),
        )
        .route(
            "/api/v1/analyses/:id",
            get(analysis::handle_get_analysis).delete(analysis::handle_delete_analysis),
        )
        .route(
            "/api/v1/analyses/:id/status",
            patch(analysis::handle_update_status),
        )
        // Generation API
        .route(
            "/api/v1/generations",
            get(generation::handle_list_generations).post(generation::handle_generate),
        )
        .route(
            "/api/v1/generations/:id",
            get(generation::handle_get_generation),
        )
        .route(
            "/api/v1/generations/:id/export",
            get(generation::handle_export_generation),
        )
        .with_state(state)
}
