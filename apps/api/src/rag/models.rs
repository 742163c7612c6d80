//! RAG profile data model — the user's canonical knowledge base extracted from
//! uploaded documents.
//!
//! Every section is `#[serde(default)]`: a malformed or missing section
//! deserializes to an empty value. Downstream components (dedup, scoring,
//! generation) never see a hard error from a partial profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// User-assigned weight on a realisation or skill.
///
/// Once set, a tag persists across regenerations and dedup passes — merges may
/// upgrade a tag (max wins) but never silently reset it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTag {
    Important,
    Inclus,
    Exclu,
}

impl WeightTag {
    /// Cyclic transition used by the weight-tag toggle in the editor:
    /// important → inclus → exclu → important.
    pub fn cycle_next(self) -> Self {
        match self {
            WeightTag::Important => WeightTag::Inclus,
            WeightTag::Inclus => WeightTag::Exclu,
            WeightTag::Exclu => WeightTag::Important,
        }
    }

    /// Merge priority: a higher value wins when two duplicate items carry
    /// different tags.
    pub fn priority(self) -> u8 {
        match self {
            WeightTag::Important => 2,
            WeightTag::Inclus => 1,
            WeightTag::Exclu => 0,
        }
    }
}

/// Merges two optional weight tags, max priority wins. `None` never overwrites
/// an existing tag.
pub fn merge_weight(a: Option<WeightTag>, b: Option<WeightTag>) -> Option<WeightTag> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if x.priority() >= y.priority() { x } else { y }),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Identity block of the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilHeader {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Elevator pitch shown at the top of generated CVs.
    #[serde(default)]
    pub pitch: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
}

/// A single achievement bullet inside an experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Realisation {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<WeightTag>,
}

impl Realisation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub date_start: Option<String>,
    #[serde(default)]
    pub date_end: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    /// Ordered achievement bullets. Order is user-controlled and preserved.
    #[serde(default)]
    pub realisations: Vec<Realisation>,
}

impl Experience {
    /// Text used for similarity comparison and grounding serialization.
    pub fn combined_text(&self) -> String {
        let mut parts = vec![self.role.clone(), self.company.clone()];
        parts.extend(self.date_start.iter().cloned());
        parts.extend(self.date_end.iter().cloned());
        parts.extend(self.technologies.iter().cloned());
        parts.extend(self.realisations.iter().map(|r| r.text.clone()));
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }
}

/// A named skill with an optional user weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<WeightTag>,
}

impl SkillItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Competences {
    #[serde(default)]
    pub technical: Vec<SkillItem>,
    #[serde(default)]
    pub soft: Vec<SkillItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: Option<String>,
}

impl Formation {
    pub fn combined_text(&self) -> String {
        format!(
            "{} {} {}",
            self.degree,
            self.institution,
            self.year.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl Certification {
    pub fn combined_text(&self) -> String {
        format!(
            "{} {}",
            self.name,
            self.issuer.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

/// Review status of an AI-inferred item in `contexte_enrichi`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredStatus {
    #[default]
    Pending,
    Validated,
    Rejected,
}

/// An implicit responsibility or skill inferred by the extraction LLM.
/// Confidence is constrained to 60–100 at creation; each item is independently
/// validatable or rejectable by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredItem {
    pub text: String,
    pub confidence: u8,
    #[serde(default)]
    pub status: InferredStatus,
}

/// The full RAG profile.
///
/// Lifecycle: created on first document upload, mutated by edits, dedup passes,
/// and re-uploads; never hard-deleted except on explicit reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagProfile {
    #[serde(default)]
    pub profil: ProfilHeader,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub competences: Competences,
    #[serde(default)]
    pub formations: Vec<Formation>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    /// language → level, e.g. "anglais" → "C1".
    #[serde(default)]
    pub langues: BTreeMap<String, String>,
    #[serde(default)]
    pub contexte_enrichi: Vec<InferredItem>,
}
