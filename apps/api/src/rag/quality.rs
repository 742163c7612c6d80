//! Quality scoring — deterministic 0–100 completeness score for a RAG profile.
//!
//! Recomputed after every dedup pass or profile edit and persisted alongside the
//! profile. Pure weighted sum over section presence and density; no I/O.

use serde::{Deserialize, Serialize};

use crate::rag::models::RagProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionScore {
    pub section: String,
    /// 0.0 – 1.0 before weighting.
    pub score: f64,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_score: u8,
    pub sections: Vec<SectionScore>,
}

/// Section weights, summing to 1.0. Experiences dominate because they feed the
/// widget generator the most material.
const SECTION_WEIGHTS: &[(&str, f64)] = &[
    ("profil", 0.15),
    ("experiences", 0.35),
    ("competences", 0.20),
    ("formations", 0.10),
    ("certifications", 0.05),
    ("langues", 0.05),
    ("contexte_enrichi", 0.10),
];

/// Computes the quality report for a profile. Deterministic and fast (<10ms).
pub fn calculate_quality_score(profile: &RagProfile) -> QualityReport {
    let mut sections = Vec::new();
    let mut weighted_sum = 0.0;

    for (key, weight) in SECTION_WEIGHTS {
        let (score, recommendations) = score_section(profile, key);
        weighted_sum += score * weight;

        let status = match score {
            s if s >= 0.8 => SectionStatus::Strong,
            s if s >= 0.5 => SectionStatus::Moderate,
            s if s > 0.0 => SectionStatus::Weak,
            _ => SectionStatus::Missing,
        };

        sections.push(SectionScore {
            section: key.to_string(),
            score,
            status,
            recommendations,
        });
    }

    QualityReport {
        overall_score: (weighted_sum * 100.0).round().clamp(0.0, 100.0) as u8,
        sections,
    }
}

fn score_section(profile: &RagProfile, key: &str) -> (f64, Vec<String>) {
    let mut recs = Vec::new();

    let score = match key {
        "profil" => {
            let p = &profile.profil;
            let fields = [
                !p.name.is_empty(),
                !p.title.is_empty(),
                p.email.is_some(),
                p.location.is_some(),
                p.pitch.as_deref().map(|s| !s.is_empty()).unwrap_or(false),
            ];
            let filled = fields.iter().filter(|&&f| f).count();
            if p.pitch.is_none() {
                recs.push("Add an elevator pitch to anchor the summary section".to_string());
            }
            filled as f64 / fields.len() as f64
        }
        "experiences" => {
            if profile.experiences.is_empty() {
                recs.push("Upload a CV or add experiences to build your profile".to_string());
                0.0
            } else {
                // Count saturates at 4 experiences; density rewards ≥3 bullets each.
                let count_score = (profile.experiences.len() as f64 / 4.0).min(1.0);
                let densities: f64 = profile
                    .experiences
                    .iter()
                    .map(|e| (e.realisations.len() as f64 / 3.0).min(1.0))
                    .sum::<f64>()
                    / profile.experiences.len() as f64;
                let thin = profile
                    .experiences
                    .iter()
                    .filter(|e| e.realisations.len() < 2)
                    .count();
                if thin > 0 {
                    recs.push(format!(
                        "{thin} experience(s) have fewer than 2 achievements — add concrete results"
                    ));
                }
                0.5 * count_score + 0.5 * densities
            }
        }
        "competences" => {
            let total = profile.competences.technical.len() + profile.competences.soft.len();
            if total == 0 {
                recs.push("Add technical and soft skills".to_string());
            }
            (total as f64 / 10.0).min(1.0)
        }
        "formations" => (profile.formations.len() as f64 / 2.0).min(1.0),
        "certifications" => (profile.certifications.len() as f64 / 2.0).min(1.0),
        "langues" => (profile.langues.len() as f64 / 2.0).min(1.0),
        "contexte_enrichi" => {
            let validated = profile
                .contexte_enrichi
                .iter()
                .filter(|i| i.status == crate::rag::models::InferredStatus::Validated)
                .count();
            let pending = profile
                .contexte_enrichi
                .iter()
                .filter(|i| i.status == crate::rag::models::InferredStatus::Pending)
                .count();
            if pending > 0 {
                recs.push(format!(
                    "{pending} inferred item(s) awaiting review — validate or reject them"
                ));
            }
            if profile.contexte_enrichi.is_empty() {
                0.0
            } else {
                // Validated items count fully, pending ones at half value.
                (validated as f64 + pending as f64 * 0.5) / profile.contexte_enrichi.len() as f64
            }
        }
        _ => 0.0,
    };

    (score.clamp(0.0, 1.0), recs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::models::{
        Competences, Experience, Formation, InferredItem, InferredStatus, ProfilHeader,
        RagProfile, Realisation, SkillItem,
    };

    fn full_profile() -> RagProfile {
        RagProfile {
            profil: ProfilHeader {
                name: "Ada Lovelace".to_string(),
                title: "Staff Engineer".to_string(),
                email: Some("ada@example.com".to_string()),
                location: Some("Lyon".to_string()),
                pitch: Some("Engineer focused on payment systems".to_string()),
                ..Default::default()
            },
            experiences: (0..4)
                .map(|i| Experience {
                    role: format!("Role {i}"),
                    company: "Acme".to_string(),
                    realisations: vec![
                        Realisation::new("Did a thing with 40% impact"),
                        Realisation::new("Shipped another measurable thing"),
                        Realisation::new("Led a third initiative"),
                    ],
                    ..Default::default()
                })
                .collect(),
            competences: Competences {
                technical: (0..8).map(|i| SkillItem::new(format!("Skill{i}"))).collect(),
                soft: vec![SkillItem::new("Leadership"), SkillItem::new("Mentoring")],
            },
            formations: vec![Formation::default(), Formation::default()],
            certifications: vec![Default::default(), Default::default()],
            langues: [("anglais", "C1"), ("français", "natif")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            contexte_enrichi: vec![InferredItem {
                text: "Implicit team leadership".to_string(),
                confidence: 80,
                status: InferredStatus::Validated,
            }],
        }
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let report = calculate_quality_score(&RagProfile::default());
        assert_eq!(report.overall_score, 0);
        assert!(report
            .sections
            .iter()
            .all(|s| s.status == SectionStatus::Missing));
    }

    #[test]
    fn test_full_profile_scores_100() {
        let report = calculate_quality_score(&full_profile());
        assert_eq!(report.overall_score, 100, "sections: {:?}", report.sections);
    }

    #[test]
    fn test_score_is_deterministic() {
        let profile = full_profile();
        let a = calculate_quality_score(&profile);
        let b = calculate_quality_score(&profile);
        assert_eq!(a.overall_score, b.overall_score);
    }

    #[test]
    fn test_thin_experiences_generate_recommendation() {
        let profile = RagProfile {
            experiences: vec![Experience {
                role: "Dev".to_string(),
                realisations: vec![Realisation::new("One bullet only")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let report = calculate_quality_score(&profile);
        let exp = report
            .sections
            .iter()
            .find(|s| s.section == "experiences")
            .unwrap();
        assert!(!exp.recommendations.is_empty());
    }

    #[test]
    fn test_pending_inferred_items_score_half() {
        let mut profile = RagProfile::default();
        profile.contexte_enrichi = vec![
            InferredItem {
                text: "a".to_string(),
                confidence: 70,
                status: InferredStatus::Pending,
            },
            InferredItem {
                text: "b".to_string(),
                confidence: 70,
                status: InferredStatus::Validated,
            },
        ];
        let report = calculate_quality_score(&profile);
        let section = report
            .sections
            .iter()
            .find(|s| s.section == "contexte_enrichi")
            .unwrap();
        assert!((section.score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_section_weights_sum_to_one() {
        let total: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
