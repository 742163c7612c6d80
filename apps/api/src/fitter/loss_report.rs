//! Loss report — tells the user what content was dropped, and at which stage,
//! between the generated widgets and the final one-page résumé.

use serde::{Deserialize, Serialize};

use crate::fitter::catalog::TemplateSpec;
use crate::fitter::fit::FitResult;
use crate::render::schema::{ExperienceFormat, RendererResume};
use crate::widgets::bridge::BridgeOptions;
use crate::widgets::models::WidgetsEnvelope;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossStage {
    pub stage: String,
    pub items_in: usize,
    pub items_out: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl LossStage {
    pub fn items_lost(&self) -> usize {
        self.items_in.saturating_sub(self.items_out)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvLossReport {
    pub stages: Vec<LossStage>,
    /// Profile fields the chosen template never renders.
    pub template_omitted_fields: Vec<String>,
    pub total_widgets_in: usize,
    pub total_items_rendered: usize,
}

fn rendered_item_count(resume: &RendererResume) -> usize {
    let experience_items: usize = resume
        .experiences
        .iter()
        .map(|e| 1 + e.bullets.len().min(e.format.bullet_cap()))
        .sum();
    experience_items + resume.competences.len() + resume.formations.len()
}

/// Builds the stage-by-stage loss report for one generation.
///
/// Stages mirror the pipeline: relevance filtering and caps in the bridge,
/// then page fitting. Each stage reports how many content items entered and
/// left it, with human-readable detail for the losses a user would ask about.
pub fn build_cv_loss_report(
    envelope: &WidgetsEnvelope,
    opts: &BridgeOptions,
    bridged: &RendererResume,
    fitted: &FitResult,
    spec: &TemplateSpec,
) -> CvLossReport {
    let total_widgets = envelope.widgets.len();
    let above_threshold = envelope
        .widgets
        .iter()
        .filter(|w| w.relevance_score >= opts.min_score)
        .count();

    let mut filter_details = Vec::new();
    if total_widgets > above_threshold {
        filter_details.push(format!(
            "{} widget(s) below min_score {}",
            total_widgets - above_threshold,
            opts.min_score
        ));
    }

    let bridged_items = rendered_item_count(bridged);
    let mut caps_details = Vec::new();
    if bridged.experiences.len() < count_bridge_candidates(envelope, opts) {
        caps_details.push(format!(
            "experiences capped at {}",
            opts.max_experiences
        ));
    }

    let fitted_items = rendered_item_count(&fitted.cv_data);
    let mut fit_details = Vec::new();
    let excluded = bridged.experiences.len() - fitted.cv_data.experiences.len();
    for exp in bridged
        .experiences
        .iter()
        .rev()
        .take(excluded)
    {
        fit_details.push(format!(
            "experience \"{} — {}\" excluded from the page",
            exp.role, exp.company
        ));
    }
    for exp in &fitted.cv_data.experiences {
        if exp.format != ExperienceFormat::Detailed {
            fit_details.push(format!(
                "experience \"{}\" compressed to {}",
                exp.role,
                exp.format.label()
            ));
        }
    }

    CvLossReport {
        stages: vec![
            LossStage {
                stage: "relevance_filter".to_string(),
                items_in: total_widgets,
                items_out: above_threshold,
                details: filter_details,
            },
            LossStage {
                stage: "selection_caps".to_string(),
                items_in: above_threshold,
                items_out: bridged_items,
                details: caps_details,
            },
            LossStage {
                stage: "page_fit".to_string(),
                items_in: bridged_items,
                items_out: fitted_items,
                details: fit_details,
            },
        ],
        template_omitted_fields: spec
            .omitted_fields
            .iter()
            .map(|f| f.to_string())
            .collect(),
        total_widgets_in: total_widgets,
        total_items_rendered: fitted_items,
    }
}

/// Distinct experiences that had at least one widget above the threshold.
fn count_bridge_candidates(envelope: &WidgetsEnvelope, opts: &BridgeOptions) -> usize {
    let mut ids: Vec<usize> = envelope
        .widgets
        .iter()
        .filter(|w| w.relevance_score >= opts.min_score)
        .filter_map(|w| w.sources.rag_experience_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}
