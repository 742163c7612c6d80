//! AI widget schema — the contract between the widget generator and every
//! downstream consumer (bridge, fitter, editor UI).
//!
//! The Widgets Envelope JSON shape is the one wire format that must stay exact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    SummaryBlock,
    ExperienceHeader,
    ExperienceBullet,
    SkillItem,
    EducationItem,
    ProjectItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Summary,
    Experiences,
    Skills,
    Education,
    Projects,
}

/// Traceability pointers from a widget back into the RAG profile.
/// Experience and realisation ids are positional indices into the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetSources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_experience_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_realisation_id: Option<usize>,
    /// Dotted path for non-experience sources, e.g. "competences.technical.3".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetQuality {
    #[serde(default)]
    pub grounded: Option<bool>,
    #[serde(default)]
    pub needs_review: bool,
}

/// The smallest unit of generated CV content. Every widget's text must be
/// traceable to its `sources` — numeric claims especially must literally appear
/// in the source text (enforced by the grounding checker, advisory for now).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiWidget {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub section: Section,
    pub text: String,
    /// 0–100, specific to the job this envelope was generated for.
    pub relevance_score: u8,
    #[serde(default)]
    pub sources: WidgetSources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<WidgetQuality>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobContext {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub match_score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The full LLM output for one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetsEnvelope {
    #[serde(default)]
    pub profil_summary: String,
    #[serde(default)]
    pub job_context: JobContext,
    pub widgets: Vec<AiWidget>,
    #[serde(default)]
    pub meta: EnvelopeMeta,
}

impl WidgetsEnvelope {
    /// Validates the envelope schema. Returns every violation found so callers
    /// can log the full picture before rejecting.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        if self.widgets.is_empty() {
            violations.push("widgets array is empty (minimum 1 required)".to_string());
        }
        for (i, w) in self.widgets.iter().enumerate() {
            if w.id.trim().is_empty() {
                violations.push(format!("widget[{i}] has an empty id"));
            }
            if w.text.trim().is_empty() {
                violations.push(format!("widget[{i}] has empty text"));
            }
            if w.relevance_score > 100 {
                violations.push(format!(
                    "widget[{i}] relevance_score {} exceeds 100",
                    w.relevance_score
                ));
            }
            if w.widget_type == WidgetType::ExperienceBullet
                && w.sources.rag_experience_id.is_none()
            {
                violations.push(format!(
                    "widget[{i}] is an experience_bullet without sources.rag_experience_id"
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
