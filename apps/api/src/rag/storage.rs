//! RAG profile persistence — one JSONB document per user.
//!
//! The profile is stored whole: partial updates go through read-modify-write
//! in the handlers so every write path recomputes the quality score.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::rag::models::RagProfile;
use crate::rag::quality::calculate_quality_score;

#[derive(Debug, Clone, FromRow)]
pub struct RagProfileRow {
    pub user_id: Uuid,
    pub profile: Json<RagProfile>,
    /// Denormalized overall quality score, recomputed on every write.
    pub quality_score: i16,
    pub updated_at: DateTime<Utc>,
}

/// Fetches a user's RAG profile, if one exists.
pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<RagProfileRow>, AppError> {
    let row: Option<RagProfileRow> = sqlx::query_as(
        "SELECT user_id, profile, quality_score, updated_at
         FROM rag_profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Upserts the whole profile and recomputes its quality score.
/// Returns the fresh overall score.
pub async fn save_profile(
    pool: &PgPool,
    user_id: Uuid,
    profile: &RagProfile,
) -> Result<u8, AppError> {
    let quality = calculate_quality_score(profile);

    sqlx::query(
        r#"
        INSERT INTO rag_profiles (user_id, profile, quality_score, updated_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (user_id)
        DO UPDATE SET profile = $2, quality_score = $3, updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(Json(profile))
    .bind(quality.overall_score as i16)
    .execute(pool)
    .await?;

    info!(
        %user_id,
        quality = quality.overall_score,
        experiences = profile.experiences.len(),
        "rag profile saved"
    );
    Ok(quality.overall_score)
}

/// Deletes the profile entirely. Returns whether a row existed.
pub async fn reset_profile(pool: &PgPool, user_id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM rag_profiles WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Convenience: profile or a 412 telling the caller to build one first.
pub async fn require_profile(pool: &PgPool, user_id: Uuid) -> Result<RagProfile, AppError> {
    get_profile(pool, user_id)
        .await?
        .map(|row| row.profile.0)
        .ok_or_else(|| {
            AppError::MissingPrerequisite(format!(
                "no RAG profile for user {user_id}; upload a document first"
            ))
        })
}
