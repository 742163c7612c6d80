//! CV generation pipeline — orchestrates the full path from stored profile +
//! analysis to a fitted, persisted résumé.
//!
//! Flow: require profile → require analysis → cache probe → widget generation
//! (LLM) → grounding audit → bridge → profile enrichment → template fit →
//! loss report → single-insert persistence → cache fill.
//!
//! Persistence is all-or-nothing: a failure anywhere leaves no partial row.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::models::JobAnalysisRow;
use crate::errors::AppError;
use crate::fitter::catalog::{default_template, get_template, template_names, TemplateSpec};
use crate::fitter::fit::{fit_to_template, UnitStats};
use crate::fitter::loss_report::{build_cv_loss_report, CvLossReport};
use crate::generation::cache::{cache_key, GenerationCache, CACHE_TTL_SECS};
use crate::llm_client::LlmClient;
use crate::rag::models::RagProfile;
use crate::rag::storage::require_profile;
use crate::render::schema::RendererResume;
use crate::widgets::bridge::{convert_widgets_to_cv, BridgeOptions};
use crate::widgets::generator::{generate_widgets, GenerationError};
use crate::widgets::grounding::generate_grounding_report;
use crate::widgets::models::WidgetsEnvelope;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCvRequest {
    pub user_id: Uuid,
    pub analysis_id: Uuid,
    /// Template name; defaults to the catalog default.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub options: Option<BridgeOptions>,
}

/// Advisory grounding audit attached to the response. Flagged widgets are
/// logged and surfaced, never blocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingSummary {
    pub widgets_checked: usize,
    pub widgets_flagged: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCvResponse {
    pub generation_id: Uuid,
    pub template: String,
    pub cv_data: RendererResume,
    pub compression_level_applied: u32,
    pub dense: bool,
    pub unit_stats: UnitStats,
    pub loss_report: CvLossReport,
    /// Mean relevance of widgets that survived the min_score filter.
    pub ats_score: u8,
    pub grounding: GroundingSummary,
    pub generation_duration_ms: u64,
    /// True when served from the idempotency cache.
    pub cached: bool,
}

/// Runs the full generation pipeline for one request.
pub async fn generate_cv(
    db: &PgPool,
    llm: &LlmClient,
    cache: &dyn GenerationCache,
    req: GenerateCvRequest,
) -> Result<GenerateCvResponse, AppError> {
    let started = Instant::now();

    let profile = require_profile(db, req.user_id).await?;
    let analysis = require_analysis(db, req.user_id, req.analysis_id).await?;
    let spec = resolve_template(req.template.as_deref())?;
    let opts = req.options.unwrap_or_default();

    let key = cache_key(req.user_id, req.analysis_id, spec.name, &opts);
    if let Some(hit) = cache.get(&key).await? {
        if let Ok(mut cached) = serde_json::from_str::<GenerateCvResponse>(&hit) {
            info!(%key, "generation served from cache");
            cached.cached = true;
            return Ok(cached);
        }
        warn!(%key, "cache entry unreadable, regenerating");
    }

    let envelope = generate_widgets(llm, &profile, &analysis.raw_text)
        .await
        .map_err(map_generation_error)?;

    let grounding = audit_grounding(&envelope, &profile);

    let mut bridged = convert_widgets_to_cv(&envelope, &opts);
    enrich_from_profile(&mut bridged, &profile);

    let fitted = fit_to_template(&bridged, spec);
    let loss_report = build_cv_loss_report(&envelope, &opts, &bridged, &fitted, spec);
    let ats_score = mean_surviving_relevance(&envelope, opts.min_score);

    let generation_id = Uuid::new_v4();
    let generation_duration_ms = started.elapsed().as_millis() as u64;

    sqlx::query(
        r#"
        INSERT INTO cv_generations
            (id, user_id, analysis_id, template, cv_data, loss_report, unit_stats,
             ats_score, compression_level, dense, generation_duration_ms, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
        "#,
    )
    .bind(generation_id)
    .bind(req.user_id)
    .bind(req.analysis_id)
    .bind(spec.name)
    .bind(SqlJson(&fitted.cv_data))
    .bind(SqlJson(&loss_report))
    .bind(SqlJson(&fitted.unit_stats))
    .bind(ats_score as i16)
    .bind(fitted.compression_level_applied as i32)
    .bind(fitted.dense)
    .bind(generation_duration_ms as i64)
    .execute(db)
    .await?;

    info!(
        %generation_id,
        template = spec.name,
        compression_level = fitted.compression_level_applied,
        dense = fitted.dense,
        ats_score,
        generation_duration_ms,
        "cv generation persisted"
    );

    let response = GenerateCvResponse {
        generation_id,
        template: spec.name.to_string(),
        cv_data: fitted.cv_data,
        compression_level_applied: fitted.compression_level_applied,
        dense: fitted.dense,
        unit_stats: fitted.unit_stats,
        loss_report,
        ats_score,
        grounding,
        generation_duration_ms,
        cached: false,
    };

    // Cache failures never fail a successful generation.
    match serde_json::to_string(&response) {
        Ok(serialized) => {
            if let Err(e) = cache.set(&key, &serialized, CACHE_TTL_SECS).await {
                warn!(%key, error = %e, "failed to cache generation");
            }
        }
        Err(e) => warn!(%key, error = %e, "failed to serialize generation for cache"),
    }

    Ok(response)
}

async fn require_analysis(
    db: &PgPool,
    user_id: Uuid,
    analysis_id: Uuid,
) -> Result<JobAnalysisRow, AppError> {
    let row: Option<JobAnalysisRow> = sqlx::query_as(
        "SELECT id, user_id, company, title, raw_text, context, match_score,
                match_report, application_status, created_at, updated_at
         FROM job_analyses WHERE id = $1 AND user_id = $2",
    )
    .bind(analysis_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    row.ok_or_else(|| {
        AppError::MissingPrerequisite(format!(
            "analysis {analysis_id} not found; analyze the job offer first"
        ))
    })
}

fn resolve_template(name: Option<&str>) -> Result<&'static TemplateSpec, AppError> {
    match name {
        None => Ok(default_template()),
        Some(n) => get_template(n).ok_or_else(|| {
            AppError::Validation(format!(
                "unknown template '{n}' (available: {})",
                template_names().join(", ")
            ))
        }),
    }
}

fn map_generation_error(e: GenerationError) -> AppError {
    match e {
        GenerationError::Upstream(inner) => AppError::Llm(inner),
        GenerationError::MalformedOutput(inner) => {
            AppError::UnprocessableEntity(format!("LLM output is not valid JSON: {inner}"))
        }
        GenerationError::SchemaInvalid { violations } => AppError::UnprocessableEntity(format!(
            "LLM output failed schema validation: {}",
            violations.join("; ")
        )),
    }
}

fn audit_grounding(envelope: &WidgetsEnvelope, profile: &RagProfile) -> GroundingSummary {
    let mut flagged = 0usize;
    for widget in &envelope.widgets {
        let report = generate_grounding_report(widget, profile);
        if !report.overall {
            flagged += 1;
            warn!(
                widget_id = %widget.id,
                missing_numbers = ?report.numbers.missing_numbers,
                "widget failed grounding checks"
            );
        }
    }
    GroundingSummary {
        widgets_checked: envelope.widgets.len(),
        widgets_flagged: flagged,
    }
}

/// Fills renderer fields the widgets cannot know: identity, languages, and
/// experience periods recovered from the profile.
fn enrich_from_profile(resume: &mut RendererResume, profile: &RagProfile) {
    let header = &profile.profil;
    resume.profil.name = header.name.clone();
    if resume.profil.title.is_empty() {
        resume.profil.title = header.title.clone();
    }
    resume.profil.email = header.email.clone();
    resume.profil.phone = header.phone.clone();
    resume.profil.location = header.location.clone();
    resume.profil.linkedin = header.linkedin.clone();
    resume.profil.photo_url = header.photo_url.clone();
    if resume.profil.summary.is_empty() {
        resume.profil.summary = header.pitch.clone().unwrap_or_default();
    }

    resume.langues = profile.langues.clone();
    if resume.formations.is_empty() {
        resume.formations = profile.formations.iter().map(|f| f.combined_text()).collect();
    }

    for exp in &mut resume.experiences {
        if exp.period.is_some() {
            continue;
        }
        let matched = profile.experiences.iter().find(|p| {
            (!p.role.is_empty() && exp.role.to_lowercase().contains(&p.role.to_lowercase()))
                || (!p.company.is_empty()
                    && exp.company.to_lowercase() == p.company.to_lowercase())
        });
        if let Some(p) = matched {
            exp.period = format_period(p.date_start.as_deref(), p.date_end.as_deref());
        }
    }
}

fn format_period(start: Option<&str>, end: Option<&str>) -> Option<String> {
    match (start, end) {
        (Some(s), Some(e)) => Some(format!("{s} - {e}")),
        (Some(s), None) => Some(format!("{s} - aujourd'hui")),
        (None, Some(e)) => Some(e.to_string()),
        (None, None) => None,
    }
}

/// ATS proxy score: mean relevance of widgets that survived filtering.
fn mean_surviving_relevance(envelope: &WidgetsEnvelope, min_score: u8) -> u8 {
    let surviving: Vec<u32> = envelope
        .widgets
        .iter()
        .filter(|w| w.relevance_score >= min_score)
        .map(|w| w.relevance_score as u32)
        .collect();
    if surviving.is_empty() {
        return 0;
    }
    (surviving.iter().sum::<u32>() / surviving.len() as u32) as u8
}
