//! Axum route handlers for the Generation API.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::models::CvGenerationRow;
use crate::generation::pipeline::{generate_cv, GenerateCvRequest, GenerateCvResponse};
use crate::render::export::{export_json, export_markdown};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// POST /api/v1/generations
///
/// Full pipeline: profile + analysis → widgets → bridge → fit → persist.
/// Identical requests within an hour are served from cache.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateCvRequest>,
) -> Result<Json<GenerateCvResponse>, AppError> {
    let response = generate_cv(
        &state.db,
        &state.llm,
        state.generation_cache.as_ref(),
        request,
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/v1/generations
pub async fn handle_list_generations(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<CvGenerationRow>>, AppError> {
    let rows: Vec<CvGenerationRow> = sqlx::query_as(
        "SELECT id, user_id, analysis_id, template, cv_data, loss_report, unit_stats,
                ats_score, compression_level, dense, generation_duration_ms, created_at
         FROM cv_generations WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/v1/generations/:id
pub async fn handle_get_generation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CvGenerationRow>, AppError> {
    fetch_generation(&state, id, params.user_id).await.map(Json)
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub user_id: Uuid,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "markdown".to_string()
}

/// GET /api/v1/generations/:id/export?format=markdown|json
pub async fn handle_export_generation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let row = fetch_generation(&state, id, params.user_id).await?;

    let (content_type, body) = match params.format.as_str() {
        "markdown" | "md" => (
            "text/markdown; charset=utf-8",
            export_markdown(&row.cv_data.0),
        ),
        "json" => ("application/json", export_json(&row.cv_data.0)?),
        other => {
            return Err(AppError::Validation(format!(
                "unknown export format '{other}' (available: markdown, json)"
            )))
        }
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        body,
    ))
}

async fn fetch_generation(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
) -> Result<CvGenerationRow, AppError> {
    let row: Option<CvGenerationRow> = sqlx::query_as(
        "SELECT id, user_id, analysis_id, template, cv_data, loss_report, unit_stats,
                ats_score, compression_level, dense, generation_duration_ms, created_at
         FROM cv_generations WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;
    row.ok_or_else(|| AppError::NotFound(format!("generation {id} not found")))
}
