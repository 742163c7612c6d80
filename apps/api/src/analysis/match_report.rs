//! Match report — explains a match score: what carries the application, what
//! is missing, and which offer keywords the profile never mentions.

use serde::{Deserialize, Serialize};

use crate::analysis::offer_parser::JobOfferContext;
use crate::analysis::relevance::RelevanceScorer;
use crate::rag::dedup::normalize_tokens;
use crate::rag::models::RagProfile;

/// Profile items scoring at or above this count as strengths. Calibrated to
/// the keyword scorer: a bullet matching a few of the offer's requirement
/// keywords lands in the 55–70 band, well clear of the neutral 50.
const STRENGTH_THRESHOLD: u8 = 60;
const MAX_STRENGTHS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapEntry {
    pub skill: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchReport {
    /// Highest-scoring profile items for this offer, best first.
    pub strengths: Vec<String>,
    /// Offer skills the profile shows no evidence of, with a suggestion each.
    pub gaps: Vec<GapEntry>,
    /// Offer skill tokens absent from the whole profile.
    pub missing_keywords: Vec<String>,
}

/// Builds the full match report for one (profile, offer) pair.
pub async fn build_match_report(
    profile: &RagProfile,
    ctx: &JobOfferContext,
    scorer: &dyn RelevanceScorer,
) -> MatchReport {
    if ctx.is_empty {
        return MatchReport::default();
    }

    let mut scored: Vec<(u8, String)> = Vec::new();
    for exp in &profile.experiences {
        for real in &exp.realisations {
            let score = scorer.score(&real.text, real.weight, ctx).await;
            scored.push((score, real.text.clone()));
        }
    }
    for skill in &profile.competences.technical {
        let score = scorer.score(&skill.name, skill.weight, ctx).await;
        scored.push((score, skill.name.clone()));
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    let strengths: Vec<String> = scored
        .iter()
        .filter(|(score, _)| *score >= STRENGTH_THRESHOLD)
        .take(MAX_STRENGTHS)
        .map(|(_, text)| text.clone())
        .collect();

    let missing_keywords = missing_skill_tokens(profile, ctx);
    let gaps = missing_keywords
        .iter()
        .map(|skill| GapEntry {
            skill: skill.clone(),
            suggestion: format!(
                "L'offre mentionne \"{skill}\" mais votre profil n'en montre aucune \
                 trace. Ajoutez une expérience ou compétence qui le couvre."
            ),
        })
        .collect();

    MatchReport {
        strengths,
        gaps,
        missing_keywords,
    }
}

/// Offer skill tokens with no occurrence anywhere in the serialized profile.
fn missing_skill_tokens(profile: &RagProfile, ctx: &JobOfferContext) -> Vec<String> {
    let profile_text = serde_json::to_string(profile).unwrap_or_default();
    let profile_tokens = normalize_tokens(&profile_text);

    ctx.skill_tokens
        .iter()
        .filter(|skill| !profile_tokens.contains(skill.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::offer_parser::parse_job_offer_from_text;
    use crate::analysis::relevance::KeywordRelevanceScorer;
    use crate::rag::models::{Competences, Experience, Realisation, SkillItem, WeightTag};

    const OFFER: &str = "Backend Engineer\n\
        \n\
        Requirements:\n\
        Rust and Kafka experience\n\
        Kubernetes deployments\n";

    fn make_profile() -> RagProfile {
        RagProfile {
            experiences: vec![Experience {
                role: "Backend Engineer".to_string(),
                company: "Acme".to_string(),
                realisations: vec![Realisation {
                    text: "Built Kafka consumers in Rust processing 2M events per day".to_string(),
                    weight: Some(WeightTag::Important),
                }],
                ..Default::default()
            }],
            competences: Competences {
                technical: vec![SkillItem::new("Rust"), SkillItem::new("Kafka")],
                soft: vec![],
            },
            ..Default::default()
        }
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    #[test]
    fn test_missing_keywords_finds_uncovered_skills() {
        let ctx = parse_job_offer_from_text(OFFER);
        let missing = missing_skill_tokens(&make_profile(), &ctx);
        // The profile covers rust and kafka but never mentions kubernetes.
        assert!(missing.contains(&"kubernetes".to_string()), "{missing:?}");
        assert!(!missing.contains(&"rust".to_string()));
        assert!(!missing.contains(&"kafka".to_string()));
    }

    #[test]
    fn test_gaps_carry_suggestions() {
        let ctx = parse_job_offer_from_text(OFFER);
        let report = block_on(build_match_report(
            &make_profile(),
            &ctx,
            &KeywordRelevanceScorer,
        ));
        assert!(!report.gaps.is_empty());
        assert!(report.gaps[0].suggestion.contains(&report.gaps[0].skill));
    }

    #[test]
    fn test_empty_offer_yields_empty_report() {
        let ctx = parse_job_offer_from_text("");
        let report = block_on(build_match_report(
            &make_profile(),
            &ctx,
            &KeywordRelevanceScorer,
        ));
        assert!(report.strengths.is_empty());
        assert!(report.gaps.is_empty());
    }

    #[test]
    fn test_strengths_are_relevant_items() {
        let ctx = parse_job_offer_from_text(OFFER);
        let report = block_on(build_match_report(
            &make_profile(),
            &ctx,
            &KeywordRelevanceScorer,
        ));
        assert!(
            report
                .strengths
                .iter()
                .any(|s| s.contains("Kafka") || s == "Rust" || s == "Kafka"),
            "{:?}",
            report.strengths
        );
        assert!(report.strengths.len() <= 5);
    }
}
