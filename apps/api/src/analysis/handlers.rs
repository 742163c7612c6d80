use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;

use crate::analysis::match_report::{build_match_report, MatchReport};
use crate::analysis::models::{ApplicationStatus, JobAnalysisRow};
use crate::analysis::offer_parser::{parse_job_offer_from_text, JobOfferContext};
use crate::analysis::relevance::{RelevanceScorer, NEUTRAL_SCORE};
use crate::errors::AppError;
use crate::rag::models::RagProfile;
use crate::rag::storage::get_profile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateAnalysisRequest {
    pub user_id: Uuid,
    pub raw_text: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Overall profile match for an offer: the mean relevance of the profile's
/// realisations and technical skills against the parsed context.
pub async fn compute_match_score(
    profile: &RagProfile,
    ctx: &JobOfferContext,
    scorer: &dyn RelevanceScorer,
) -> u8 {
    let mut scores: Vec<u8> = Vec::new();

    for exp in &profile.experiences {
        for real in &exp.realisations {
            scores.push(scorer.score(&real.text, real.weight, ctx).await);
        }
    }
    for skill in &profile.competences.technical {
        scores.push(scorer.score(&skill.name, skill.weight, ctx).await);
    }

    if scores.is_empty() {
        return NEUTRAL_SCORE;
    }
    let sum: u32 = scores.iter().map(|&s| s as u32).sum();
    (sum / scores.len() as u32) as u8
}

/// POST /api/v1/analyses
pub async fn handle_create_analysis(
    State(state): State<AppState>,
    Json(req): Json<CreateAnalysisRequest>,
) -> Result<Json<JobAnalysisRow>, AppError> {
    if req.raw_text.trim().is_empty() {
        return Err(AppError::Validation("raw_text must not be empty".to_string()));
    }

    let context = parse_job_offer_from_text(&req.raw_text);

    // Match scoring is best-effort: an analysis saved before any document
    // upload simply has no score yet.
    let (match_score, match_report) = match get_profile(&state.db, req.user_id).await? {
        Some(row) => {
            let scorer = state.relevance_scorer.as_ref();
            let score = compute_match_score(&row.profile.0, &context, scorer).await;
            let report = build_match_report(&row.profile.0, &context, scorer).await;
            (Some(score as i16), report)
        }
        None => (None, MatchReport::default()),
    };

    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| context.title_keywords.join(" "));
    let company = req.company.unwrap_or_default();

    let row: JobAnalysisRow = sqlx::query_as(
        r#"
        INSERT INTO job_analyses
            (id, user_id, company, title, raw_text, context, match_score,
             match_report, application_status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
        RETURNING id, user_id, company, title, raw_text, context, match_score,
                  match_report, application_status, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(&company)
    .bind(&title)
    .bind(&req.raw_text)
    .bind(SqlJson(&context))
    .bind(match_score)
    .bind(SqlJson(&match_report))
    .bind(ApplicationStatus::Saved.as_str())
    .fetch_one(&state.db)
    .await?;

    info!(analysis_id = %row.id, user_id = %row.user_id, ?match_score, "job analysis created");
    Ok(Json(row))
}

/// GET /api/v1/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JobAnalysisRow>>, AppError> {
    let rows: Vec<JobAnalysisRow> = sqlx::query_as(
        "SELECT id, user_id, company, title, raw_text, context, match_score,
                match_report, application_status, created_at, updated_at
         FROM job_analyses WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobAnalysisRow>, AppError> {
    let row: Option<JobAnalysisRow> = sqlx::query_as(
        "SELECT id, user_id, company, title, raw_text, context, match_score,
                match_report, application_status, created_at, updated_at
         FROM job_analyses WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(params.user_id)
    .fetch_optional(&state.db)
    .await?;
    row.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("analysis {id} not found")))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub user_id: Uuid,
    pub status: ApplicationStatus,
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    pub id: Uuid,
    pub application_status: ApplicationStatus,
}

/// PATCH /api/v1/analyses/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let result = sqlx::query(
        "UPDATE job_analyses SET application_status = $1, updated_at = NOW()
         WHERE id = $2 AND user_id = $3",
    )
    .bind(req.status.as_str())
    .bind(id)
    .bind(req.user_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("analysis {id} not found")));
    }
    Ok(Json(StatusUpdateResponse {
        id,
        application_status: req.status,
    }))
}

/// DELETE /api/v1/analyses/:id
pub async fn handle_delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM job_analyses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(params.user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("analysis {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::relevance::KeywordRelevanceScorer;
    use crate::rag::models::{Experience, Realisation, SkillItem};

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    #[test]
    fn test_match_score_empty_profile_is_neutral() {
        let ctx = parse_job_offer_from_text("Backend Engineer\n\nRequirements:\nRust and Kafka\n");
        let score = block_on(compute_match_score(
            &RagProfile::default(),
            &ctx,
            &KeywordRelevanceScorer,
        ));
        assert_eq!(score, NEUTRAL_SCORE);
    }

    #[test]
    fn test_match_score_reflects_profile_fit() {
        let ctx = parse_job_offer_from_text("Backend Engineer\n\nRequirements:\nRust and Kafka\n");
        let matching = RagProfile {
            experiences: vec![Experience {
                role: "Backend Engineer".to_string(),
                realisations: vec![Realisation::new("Built Kafka consumers in Rust")],
                ..Default::default()
            }],
            competences: crate::rag::models::Competences {
                technical: vec![SkillItem::new("Rust"), SkillItem::new("Kafka")],
                soft: vec![],
            },
            ..Default::default()
        };
        let unrelated = RagProfile {
            experiences: vec![Experience {
                role: "Pastry Chef".to_string(),
                realisations: vec![Realisation::new("Baked award-winning croissants")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let scorer = KeywordRelevanceScorer;
        let high = block_on(compute_match_score(&matching, &ctx, &scorer));
        let low = block_on(compute_match_score(&unrelated, &ctx, &scorer));
        assert!(high > low, "high={high} low={low}");
    }
}
