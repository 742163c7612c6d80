use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::rag::dedup::deduplicate_rag;
use crate::rag::ingest::{ingest_document, IngestResponse};
use crate::rag::models::{InferredStatus, RagProfile, WeightTag};
use crate::rag::quality::{calculate_quality_score, QualityReport};
use crate::rag::storage::{get_profile, require_profile, reset_profile, save_profile};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct RagProfileResponse {
    pub profile: RagProfile,
    pub quality: QualityReport,
}

/// GET /api/v1/rag
pub async fn handle_get_rag(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<RagProfileResponse>, AppError> {
    let row = get_profile(&state.db, params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no RAG profile for user {}", params.user_id)))?;
    let profile = row.profile.0;
    let quality = calculate_quality_score(&profile);
    Ok(Json(RagProfileResponse { profile, quality }))
}

#[derive(Deserialize)]
pub struct PutRagRequest {
    pub user_id: Uuid,
    pub profile: RagProfile,
}

#[derive(Serialize)]
pub struct PutRagResponse {
    pub quality_score: u8,
}

/// PUT /api/v1/rag — replaces the whole profile (editor "save" path).
pub async fn handle_put_rag(
    State(state): State<AppState>,
    Json(req): Json<PutRagRequest>,
) -> Result<Json<PutRagResponse>, AppError> {
    let quality_score = save_profile(&state.db, req.user_id, &req.profile).await?;
    Ok(Json(PutRagResponse { quality_score }))
}

/// DELETE /api/v1/rag
pub async fn handle_reset_rag(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let deleted = reset_profile(&state.db, params.user_id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "no RAG profile for user {}",
            params.user_id
        )))
    }
}

#[derive(Deserialize)]
pub struct IngestQuery {
    pub user_id: Uuid,
    pub filename: String,
}

/// POST /api/v1/rag/ingest — raw document bytes in the body.
pub async fn handle_ingest(
    State(state): State<AppState>,
    Query(params): Query<IngestQuery>,
    body: Bytes,
) -> Result<Json<IngestResponse>, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("empty document body".to_string()));
    }
    let response = ingest_document(
        &state.llm,
        &state.db,
        params.user_id,
        &params.filename,
        &body,
        state.config.dedup_similarity_threshold,
    )
    .await?;
    Ok(Json(response))
}

#[derive(Serialize)]
pub struct DedupResponse {
    pub experiences_before: usize,
    pub experiences_after: usize,
    pub skills_before: usize,
    pub skills_after: usize,
    pub quality_score: u8,
}

/// POST /api/v1/rag/dedup — explicit cleanup pass over the stored profile.
pub async fn handle_dedup(
    State(state): State<AppState>,
    Json(req): Json<UserIdQuery>,
) -> Result<Json<DedupResponse>, AppError> {
    let profile = require_profile(&state.db, req.user_id).await?;
    let skills_count =
        |p: &RagProfile| p.competences.technical.len() + p.competences.soft.len();

    let cleaned = deduplicate_rag(&profile, state.config.dedup_similarity_threshold);
    let quality_score = save_profile(&state.db, req.user_id, &cleaned).await?;

    Ok(Json(DedupResponse {
        experiences_before: profile.experiences.len(),
        experiences_after: cleaned.experiences.len(),
        skills_before: skills_count(&profile),
        skills_after: skills_count(&cleaned),
        quality_score,
    }))
}

/// GET /api/v1/rag/quality
pub async fn handle_quality(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<QualityReport>, AppError> {
    let profile = require_profile(&state.db, params.user_id).await?;
    Ok(Json(calculate_quality_score(&profile)))
}

#[derive(Deserialize)]
pub struct WeightCycleRequest {
    pub user_id: Uuid,
    /// Dotted path to a weighted item, e.g. "experiences.0.realisations.2"
    /// or "competences.technical.1".
    pub path: String,
}

#[derive(Serialize)]
pub struct WeightCycleResponse {
    pub path: String,
    pub weight: WeightTag,
}

/// PATCH /api/v1/rag/weight — cycles the weight tag at a path.
/// Untagged items start the cycle at `important`.
pub async fn handle_cycle_weight(
    State(state): State<AppState>,
    Json(req): Json<WeightCycleRequest>,
) -> Result<Json<WeightCycleResponse>, AppError> {
    let mut profile = require_profile(&state.db, req.user_id).await?;

    let slot = resolve_weight_path(&mut profile, &req.path)
        .ok_or_else(|| AppError::Validation(format!("unknown weight path '{}'", req.path)))?;
    let next = match *slot {
        Some(tag) => tag.cycle_next(),
        None => WeightTag::Important,
    };
    *slot = Some(next);

    save_profile(&state.db, req.user_id, &profile).await?;
    Ok(Json(WeightCycleResponse {
        path: req.path,
        weight: next,
    }))
}

/// Resolves a dotted path to the weight slot it addresses.
fn resolve_weight_path<'a>(
    profile: &'a mut RagProfile,
    path: &str,
) -> Option<&'a mut Option<WeightTag>> {
    let parts: Vec<&str> = path.split('.').collect();
    match parts.as_slice() {
        ["experiences", exp, "realisations", real] => {
            let exp: usize = exp.parse().ok()?;
            let real: usize = real.parse().ok()?;
            profile
                .experiences
                .get_mut(exp)?
                .realisations
                .get_mut(real)
                .map(|r| &mut r.weight)
        }
        ["competences", "technical", idx] => {
            let idx: usize = idx.parse().ok()?;
            profile
                .competences
                .technical
                .get_mut(idx)
                .map(|s| &mut s.weight)
        }
        ["competences", "soft", idx] => {
            let idx: usize = idx.parse().ok()?;
            profile.competences.soft.get_mut(idx).map(|s| &mut s.weight)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredAction {
    Validate,
    Reject,
}

#[derive(Deserialize)]
pub struct InferredReviewRequest {
    pub user_id: Uuid,
    pub index: usize,
    pub action: InferredAction,
}

#[derive(Serialize)]
pub struct InferredReviewResponse {
    pub index: usize,
    pub status: InferredStatus,
}

/// PATCH /api/v1/rag/inferred — validates or rejects one inferred item.
pub async fn handle_review_inferred(
    State(state): State<AppState>,
    Json(req): Json<InferredReviewRequest>,
) -> Result<Json<InferredReviewResponse>, AppError> {
    let mut profile = require_profile(&state.db, req.user_id).await?;

    let item = profile.contexte_enrichi.get_mut(req.index).ok_or_else(|| {
        AppError::NotFound(format!("no inferred item at index {}", req.index))
    })?;
    item.status = match req.action {
        InferredAction::Validate => InferredStatus::Validated,
        InferredAction::Reject => InferredStatus::Rejected,
    };
    let status = item.status;

    save_profile(&state.db, req.user_id, &profile).await?;
    Ok(Json(InferredReviewResponse {
        index: req.index,
        status,
    }))
}
