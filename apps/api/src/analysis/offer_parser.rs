//! Job-offer parser — extracts structured hints from unstructured posting text
//! using heuristic pattern matching. No LLM call: this step must stay fast and
//! free because it runs on every relevance-scoring request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rag::dedup::normalize_tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
    Lead,
}

/// A keyword from the offer text, weighted by where it appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub frequency: u32,
    /// title = 1.0, requirements block = 0.8, body = 0.4.
    pub position_weight: f32,
    /// frequency × position_weight.
    pub weighted_score: f32,
}

/// Structured context extracted from a free-text job offer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobOfferContext {
    pub title_keywords: Vec<String>,
    pub seniority: Option<Seniority>,
    /// Skill tokens found in the tech lexicon or requirement lines.
    pub skill_tokens: Vec<String>,
    pub keyword_inventory: Vec<KeywordEntry>,
    /// True when the source text was empty — scorers return neutral 50.
    pub is_empty: bool,
}

const TITLE_WEIGHT: f32 = 1.0;
const REQUIREMENTS_WEIGHT: f32 = 0.8;
const BODY_WEIGHT: f32 = 0.4;

/// Markers introducing a requirements block, English and French postings both.
const REQUIREMENT_MARKERS: &[&str] = &[
    "requirements",
    "required",
    "qualifications",
    "must have",
    "profil recherché",
    "compétences requises",
    "exigences",
];

/// Common technology tokens recognized as skills regardless of position.
/// Deliberately coarse — the relevance scorer treats unknown overlap through
/// the keyword inventory anyway.
const TECH_LEXICON: &[&str] = &[
    "python", "rust", "java", "javascript", "typescript", "react", "vue", "angular", "node",
    "golang", "kotlin", "swift", "ruby", "php", "scala", "sql", "postgresql", "mysql", "mongodb",
    "redis", "kafka", "rabbitmq", "docker", "kubernetes", "terraform", "ansible", "aws", "gcp",
    "azure", "linux", "git", "graphql", "rest", "grpc", "microservices", "devops", "agile",
    "scrum", "machine", "learning", "data", "analytics", "etl", "spark", "airflow", "django",
    "flask", "spring", "dotnet", "laravel", "symfony", "nextjs", "tailwind", "figma", "jira",
];

/// Parses a raw job-offer text into a structured context.
///
/// Empty or whitespace-only input yields `is_empty = true` and empty
/// inventories — callers get neutral scores, never an error.
pub fn parse_job_offer_from_text(raw_text: &str) -> JobOfferContext {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        return JobOfferContext {
            is_empty: true,
            ..Default::default()
        };
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    let title_line = lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .unwrap_or_default();

    let title_keywords: Vec<String> = normalize_tokens(title_line).into_iter().collect();
    let seniority = detect_seniority(trimmed);

    // Weighted keyword inventory: token → (frequency, best position weight).
    let mut inventory: BTreeMap<String, (u32, f32)> = BTreeMap::new();
    let mut in_requirements = false;

    for line in &lines {
        let lower = line.to_lowercase();
        if REQUIREMENT_MARKERS.iter().any(|m| lower.contains(m)) {
            in_requirements = true;
        } else if line.trim().is_empty() {
            // Blank line ends a requirements block.
            in_requirements = false;
        }

        let weight = if *line == title_line {
            TITLE_WEIGHT
        } else if in_requirements {
            REQUIREMENTS_WEIGHT
        } else {
            BODY_WEIGHT
        };

        for token in normalize_tokens(line) {
            let entry = inventory.entry(token).or_insert((0, weight));
            entry.0 += 1;
            entry.1 = entry.1.max(weight);
        }
    }

    let keyword_inventory: Vec<KeywordEntry> = inventory
        .into_iter()
        .map(|(keyword, (frequency, position_weight))| KeywordEntry {
            keyword,
            frequency,
            position_weight,
            weighted_score: frequency as f32 * position_weight,
        })
        .collect();

    let skill_tokens: Vec<String> = keyword_inventory
        .iter()
        .filter(|k| TECH_LEXICON.contains(&k.keyword.as_str()) || k.position_weight >= REQUIREMENTS_WEIGHT)
        .map(|k| k.keyword.clone())
        .collect();

    JobOfferContext {
        title_keywords,
        seniority,
        skill_tokens,
        keyword_inventory,
        is_empty: false,
    }
}

fn detect_seniority(text: &str) -> Option<Seniority> {
    let lower = text.to_lowercase();
    // Most senior marker wins; "lead"/"staff"/"principal" outrank "senior".
    if ["lead ", "staff ", "principal ", "head of"]
        .iter()
        .any(|m| lower.contains(m))
    {
        Some(Seniority::Lead)
    } else if lower.contains("senior") || lower.contains("confirmé") || lower.contains("sr.") {
        Some(Seniority::Senior)
    } else if lower.contains("junior") || lower.contains("débutant") || lower.contains("entry level")
    {
        Some(Seniority::Junior)
    } else if lower.contains("mid-level") || lower.contains("intermediate") {
        Some(Seniority::Mid)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFER: &str = "Senior Backend Engineer - Payments\n\
        \n\
        We build the payment platform used by thousands of merchants.\n\
        \n\
        Requirements:\n\
        5+ years with Python and PostgreSQL\n\
        Experience with Kafka and Kubernetes\n\
        \n\
        Nice to have: Terraform, GCP.";

    #[test]
    fn test_empty_text_flags_is_empty() {
        let ctx = parse_job_offer_from_text("   \n  ");
        assert!(ctx.is_empty);
        assert!(ctx.keyword_inventory.is_empty());
    }

    #[test]
    fn test_title_keywords_from_first_line() {
        let ctx = parse_job_offer_from_text(OFFER);
        assert!(ctx.title_keywords.contains(&"backend".to_string()));
        assert!(ctx.title_keywords.contains(&"payments".to_string()));
    }

    #[test]
    fn test_seniority_detected() {
        let ctx = parse_job_offer_from_text(OFFER);
        assert_eq!(ctx.seniority, Some(Seniority::Senior));
    }

    #[test]
    fn test_lead_outranks_senior() {
        let ctx = parse_job_offer_from_text("Staff Engineer, senior team");
        assert_eq!(ctx.seniority, Some(Seniority::Lead));
    }

    #[test]
    fn test_requirement_lines_weighted_above_body() {
        let ctx = parse_job_offer_from_text(OFFER);
        let weight_of = |kw: &str| {
            ctx.keyword_inventory
                .iter()
                .find(|k| k.keyword == kw)
                .map(|k| k.position_weight)
        };
        assert_eq!(weight_of("kafka"), Some(REQUIREMENTS_WEIGHT));
        assert_eq!(weight_of("merchants"), Some(BODY_WEIGHT));
    }

    #[test]
    fn test_title_tokens_get_full_weight() {
        let ctx = parse_job_offer_from_text(OFFER);
        let payments = ctx
            .keyword_inventory
            .iter()
            .find(|k| k.keyword == "payments")
            .unwrap();
        assert_eq!(payments.position_weight, TITLE_WEIGHT);
    }

    #[test]
    fn test_tech_lexicon_tokens_become_skills() {
        let ctx = parse_job_offer_from_text(OFFER);
        for skill in ["python", "postgresql", "kafka", "kubernetes"] {
            assert!(
                ctx.skill_tokens.contains(&skill.to_string()),
                "missing skill {skill}, got {:?}",
                ctx.skill_tokens
            );
        }
    }

    #[test]
    fn test_weighted_score_is_frequency_times_weight() {
        let ctx = parse_job_offer_from_text(OFFER);
        for entry in &ctx.keyword_inventory {
            assert!(
                (entry.weighted_score - entry.frequency as f32 * entry.position_weight).abs()
                    < f32::EPSILON
            );
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse_job_offer_from_text(OFFER);
        let b = parse_job_offer_from_text(OFFER);
        assert_eq!(a.keyword_inventory, b.keyword_inventory);
    }
}
