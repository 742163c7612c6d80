//! Stored CV generations — one row per successful pipeline run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::fitter::fit::UnitStats;
use crate::fitter::loss_report::CvLossReport;
use crate::render::schema::RendererResume;

/// A persisted generation. Written in a single insert once the whole pipeline
/// has succeeded; a failed pipeline leaves no row behind.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CvGenerationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub analysis_id: Uuid,
    pub template: String,
    pub cv_data: Json<RendererResume>,
    pub loss_report: Json<CvLossReport>,
    pub unit_stats: Json<UnitStats>,
    /// Mean relevance of the widgets that survived filtering, 0–100.
    pub ats_score: i16,
    pub compression_level: i32,
    pub dense: bool,
    pub generation_duration_ms: i64,
    pub created_at: DateTime<Utc>,
}
