//! Renderer résumé schema — the template-agnostic shape consumed by every
//! export target (HTML/PDF render, Word, Markdown, JSON).
//!
//! This is a derived, disposable artifact: regenerated deterministically from
//! widgets + fitting parameters, never hand-edited outside the editor UI.
//! No timestamps or random ids live here — identical inputs must produce
//! byte-identical output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Rendering format of one experience, chosen by the template fitter.
/// Detailed → standard → compact → minimal is the compression ladder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceFormat {
    #[default]
    Detailed,
    Standard,
    Compact,
    Minimal,
}

impl ExperienceFormat {
    /// Maximum bullets rendered in this format.
    pub fn bullet_cap(self) -> usize {
        match self {
            ExperienceFormat::Detailed => 5,
            ExperienceFormat::Standard => 3,
            ExperienceFormat::Compact => 1,
            ExperienceFormat::Minimal => 0,
        }
    }

    /// One demotion step down the ladder; minimal saturates.
    pub fn demote(self) -> Self {
        match self {
            ExperienceFormat::Detailed => ExperienceFormat::Standard,
            ExperienceFormat::Standard => ExperienceFormat::Compact,
            ExperienceFormat::Compact => ExperienceFormat::Minimal,
            ExperienceFormat::Minimal => ExperienceFormat::Minimal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExperienceFormat::Detailed => "detailed",
            ExperienceFormat::Standard => "standard",
            ExperienceFormat::Compact => "compact",
            ExperienceFormat::Minimal => "minimal",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RendererProfil {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RendererExperience {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Internal fitter tag — underscore-prefixed in the wire format like the
    /// other derived fields.
    #[serde(rename = "_format", default)]
    pub format: ExperienceFormat,
    /// Max relevance score of the bullets that produced this experience.
    #[serde(rename = "_relevance", default)]
    pub relevance: u8,
}

/// The final template-agnostic résumé document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RendererResume {
    #[serde(default)]
    pub profil: RendererProfil,
    #[serde(default)]
    pub experiences: Vec<RendererExperience>,
    #[serde(default)]
    pub competences: Vec<String>,
    #[serde(default)]
    pub formations: Vec<String>,
    #[serde(default)]
    pub langues: BTreeMap<String, String>,
}
