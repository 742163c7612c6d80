//! Grounding checker — verifies that generated widget text traces back to
//! source facts in the RAG profile.
//!
//! Advisory only: reports are logged for quality monitoring, never used to
//! block the generation path.

use serde::{Deserialize, Serialize};

use crate::rag::dedup::normalize_tokens;
use crate::rag::models::RagProfile;
use crate::widgets::models::{AiWidget, WidgetType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumbersGrounding {
    pub is_grounded: bool,
    /// Numeric tokens from the widget text not found in the source.
    pub missing_numbers: Vec<String>,
    pub found_numbers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingReport {
    /// True only when every applicable check passed.
    pub overall: bool,
    pub numbers: NumbersGrounding,
    /// Present for skill-type widgets only.
    pub skill: Option<bool>,
    /// Present when the widget references an experience.
    pub experience: Option<bool>,
}

/// Extracts numeric tokens from text: digit runs with optional decimal part and
/// an attached `%` when present. "40%" and "12" are distinct tokens.
fn extract_numeric_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == ',')
            {
                i += 1;
            }
            let mut token: String = chars[start..i].iter().collect();
            // Trailing separators are sentence punctuation, not part of the number.
            while token.ends_with('.') || token.ends_with(',') {
                token.pop();
            }
            if i < chars.len() && chars[i] == '%' {
                token.push('%');
                i += 1;
            }
            if !token.is_empty() {
                tokens.push(token);
            }
        } else {
            i += 1;
        }
    }

    tokens
}

/// Checks that every numeric token in the widget text literally appears in the
/// serialized source text. Prevents fabricated statistics from slipping
/// through unnoticed.
pub fn check_numbers_grounding(widget_text: &str, source_text: &str) -> NumbersGrounding {
    let mut missing = Vec::new();
    let mut found = Vec::new();

    for token in extract_numeric_tokens(widget_text) {
        if source_text.contains(&token) {
            found.push(token);
        } else {
            missing.push(token);
        }
    }

    NumbersGrounding {
        is_grounded: missing.is_empty(),
        missing_numbers: missing,
        found_numbers: found,
    }
}

/// Checks that a skill widget's skill exists somewhere in the profile:
/// competences (technical or soft) or any experience's technology list.
fn check_skill_grounding(skill_text: &str, profile: &RagProfile) -> bool {
    let skill_tokens = normalize_tokens(skill_text);
    let matches = |name: &str| {
        if skill_tokens.is_empty() {
            name.eq_ignore_ascii_case(skill_text.trim())
        } else {
            let name_tokens = normalize_tokens(name);
            !name_tokens.is_disjoint(&skill_tokens)
        }
    };

    profile.competences.technical.iter().any(|s| matches(&s.name))
        || profile.competences.soft.iter().any(|s| matches(&s.name))
        || profile
            .experiences
            .iter()
            .flat_map(|e| e.technologies.iter())
            .any(|t| matches(t))
}

/// Builds the serialized source text a widget's claims are checked against:
/// the referenced experience when one is given, otherwise the whole profile.
fn source_text_for(widget: &AiWidget, profile: &RagProfile) -> String {
    match widget.sources.rag_experience_id {
        Some(idx) => profile
            .experiences
            .get(idx)
            .map(|e| e.combined_text())
            .unwrap_or_default(),
        None => serde_json::to_string(profile).unwrap_or_default(),
    }
}

/// Runs all applicable grounding checks for a widget.
pub fn generate_grounding_report(widget: &AiWidget, profile: &RagProfile) -> GroundingReport {
    let source_text = source_text_for(widget, profile);
    let numbers = check_numbers_grounding(&widget.text, &source_text);

    let skill = match widget.widget_type {
        WidgetType::SkillItem => Some(check_skill_grounding(&widget.text, profile)),
        _ => None,
    };

    let experience = widget
        .sources
        .rag_experience_id
        .map(|idx| idx < profile.experiences.len());

    let overall =
        numbers.is_grounded && skill.unwrap_or(true) && experience.unwrap_or(true);

    GroundingReport {
        overall,
        numbers,
        skill,
        experience,
    }
}
