//! Widget → CV bridge — filters and ranks widgets into the renderer schema.
//!
//! Pure, synchronous, deterministic: this transform runs for every
//! template/theme switch in the editor, so it must finish in microseconds and
//! produce byte-identical output for identical inputs. Stable sorts preserve
//! original widget order on score ties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::render::schema::{RendererExperience, RendererProfil, RendererResume};
use crate::widgets::models::{Section, WidgetType, WidgetsEnvelope};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BridgeOptions {
    /// Widgets scoring below this are dropped from the output entirely.
    pub min_score: u8,
    pub max_experiences: usize,
    pub max_bullets_per_experience: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            min_score: 40,
            max_experiences: 5,
            max_bullets_per_experience: 5,
        }
    }
}

/// Converts a widgets envelope into a renderer-ready résumé.
///
/// Algorithm:
/// 1. Group widgets by section.
/// 2. Within experiences, group bullets under their owning experience via
///    `sources.rag_experience_id`, dropping bullets below `min_score`.
/// 3. Rank experiences by the max relevance of their surviving bullets (ties
///    resolve in envelope order), keep the top `max_experiences`.
/// 4. Within each kept experience, keep the top `max_bullets_per_experience`
///    bullets by score (stable on ties).
/// 5. Assemble skills/education/summary analogously, respecting `min_score`.
pub fn convert_widgets_to_cv(envelope: &WidgetsEnvelope, opts: &BridgeOptions) -> RendererResume {
    // Experience bullets grouped by owning experience. `first_seen` records
    // the envelope position of each experience's first widget so score ties
    // resolve in envelope order, not id order.
    let mut headers: BTreeMap<usize, String> = BTreeMap::new();
    let mut bullets: BTreeMap<usize, Vec<(u8, String)>> = BTreeMap::new();
    let mut first_seen: BTreeMap<usize, usize> = BTreeMap::new();
    let mut skills: Vec<(u8, String)> = Vec::new();
    let mut formations: Vec<(u8, String)> = Vec::new();

    for (pos, widget) in envelope.widgets.iter().enumerate() {
        if widget.relevance_score < opts.min_score {
            continue;
        }
        match (widget.widget_type, widget.section) {
            (WidgetType::ExperienceHeader, _) => {
                if let Some(exp_id) = widget.sources.rag_experience_id {
                    first_seen.entry(exp_id).or_insert(pos);
                    headers.entry(exp_id).or_insert_with(|| widget.text.clone());
                }
            }
            (WidgetType::ExperienceBullet, _) => {
                if let Some(exp_id) = widget.sources.rag_experience_id {
                    first_seen.entry(exp_id).or_insert(pos);
                    bullets
                        .entry(exp_id)
                        .or_default()
                        .push((widget.relevance_score, widget.text.clone()));
                }
            }
            (WidgetType::SkillItem, _) | (_, Section::Skills) => {
                skills.push((widget.relevance_score, widget.text.clone()));
            }
            (WidgetType::EducationItem, _) | (_, Section::Education) => {
                formations.push((widget.relevance_score, widget.text.clone()));
            }
            // Summary blocks and project items fold into the profile summary
            // handled below; project widgets without a dedicated template slot
            // are intentionally not rendered.
            _ => {}
        }
    }

    // Rank experiences by max surviving bullet score, descending; ties keep
    // envelope order.
    let mut ranked: Vec<(usize, u8)> = bullets
        .iter()
        .map(|(&exp_id, b)| (exp_id, b.iter().map(|(s, _)| *s).max().unwrap_or(0)))
        .collect();
    ranked.sort_by_key(|&(exp_id, score)| {
        (
            std::cmp::Reverse(score),
            first_seen.get(&exp_id).copied().unwrap_or(usize::MAX),
        )
    });
    ranked.truncate(opts.max_experiences);

    let experiences: Vec<RendererExperience> = ranked
        .into_iter()
        .map(|(exp_id, max_score)| {
            let mut exp_bullets = bullets.remove(&exp_id).unwrap_or_default();
            exp_bullets.sort_by(|a, b| b.0.cmp(&a.0));
            exp_bullets.truncate(opts.max_bullets_per_experience);

            let (role, company) = split_header(headers.get(&exp_id).map(String::as_str));
            RendererExperience {
                role,
                company,
                period: None,
                bullets: exp_bullets.into_iter().map(|(_, t)| t).collect(),
                format: Default::default(),
                relevance: max_score,
            }
        })
        .collect();

    skills.sort_by(|a, b| b.0.cmp(&a.0));
    formations.sort_by(|a, b| b.0.cmp(&a.0));

    RendererResume {
        profil: RendererProfil {
            title: envelope.job_context.title.clone(),
            summary: envelope.profil_summary.clone(),
            ..Default::default()
        },
        experiences,
        competences: skills.into_iter().map(|(_, t)| t).collect(),
        formations: formations.into_iter().map(|(_, t)| t).collect(),
        langues: BTreeMap::new(),
    }
}

/// Splits an experience-header widget text of the form "Role — Company" (or
/// "Role - Company", "Role @ Company") into its two parts. A headerless
/// experience gets the whole text as role.
fn split_header(header: Option<&str>) -> (String, String) {
    let header = header.unwrap_or_default();
    for sep in [" — ", " – ", " - ", " @ ", " chez "] {
        if let Some((role, company)) = header.split_once(sep) {
            return (role.trim().to_string(), company.trim().to_string());
        }
    }
    (header.trim().to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::models::{
        AiWidget, EnvelopeMeta, JobContext, WidgetSources, WidgetsEnvelope,
    };

    fn bullet(id: &str, exp_id: usize, score: u8, text: &str) -> AiWidget {
        AiWidget {
            id: id.to_string(),
            widget_type: WidgetType::ExperienceBullet,
            section: Section::Experiences,
            text: text.to_string(),
            relevance_score: score,
            sources: WidgetSources {
                rag_experience_id: Some(exp_id),
                rag_realisation_id: None,
                rag_path: None,
            },
            quality: None,
        }
    }

    fn header(id: &str, exp_id: usize, text: &str) -> AiWidget {
        AiWidget {
            id: id.to_string(),
            widget_type: WidgetType::ExperienceHeader,
            section: Section::Experiences,
            text: text.to_string(),
            relevance_score: 100,
            sources: WidgetSources {
                rag_experience_id: Some(exp_id),
                rag_realisation_id: None,
                rag_path: None,
            },
            quality: None,
        }
    }

    fn skill(id: &str, score: u8, text: &str) -> AiWidget {
        AiWidget {
            id: id.to_string(),
            widget_type: WidgetType::SkillItem,
            section: Section::Skills,
            text: text.to_string(),
            relevance_score: score,
            sources: WidgetSources::default(),
            quality: None,
        }
    }

    fn envelope(widgets: Vec<AiWidget>) -> WidgetsEnvelope {
        WidgetsEnvelope {
            profil_summary: "Seasoned backend engineer".to_string(),
            job_context: JobContext {
                company: "Acme".to_string(),
                title: "Backend Engineer".to_string(),
                match_score: 80,
            },
            widgets,
            meta: EnvelopeMeta::default(),
        }
    }

    #[test]
    fn test_bullets_below_min_score_never_appear() {
        let env = envelope(vec![
            header("h0", 0, "Dev — Acme"),
            bullet("b1", 0, 90, "Kept bullet"),
            bullet("b2", 0, 20, "Dropped bullet"),
        ]);
        let cv = convert_widgets_to_cv(&env, &BridgeOptions::default());
        let all_bullets: Vec<&String> =
            cv.experiences.iter().flat_map(|e| e.bullets.iter()).collect();
        assert!(all_bullets.iter().any(|b| b.contains("Kept")));
        assert!(!all_bullets.iter().any(|b| b.contains("Dropped")));
    }

    #[test]
    fn test_experiences_ranked_by_max_bullet_score() {
        let env = envelope(vec![
            bullet("b1", 0, 50, "Mid bullet"),
            bullet("b2", 1, 95, "Top bullet"),
            bullet("b3", 2, 70, "Second bullet"),
        ]);
        let cv = convert_widgets_to_cv(&env, &BridgeOptions::default());
        let scores: Vec<u8> = cv.experiences.iter().map(|e| e.relevance).collect();
        assert_eq!(scores, vec![95, 70, 50]);
    }

    #[test]
    fn test_max_experiences_cap_applies() {
        let widgets: Vec<AiWidget> = (0..8)
            .map(|i| bullet(&format!("b{i}"), i, 50 + i as u8, "Bullet text"))
            .collect();
        let opts = BridgeOptions {
            max_experiences: 3,
            ..Default::default()
        };
        let cv = convert_widgets_to_cv(&envelope(widgets), &opts);
        assert_eq!(cv.experiences.len(), 3);
        // The three highest-scoring experiences survive.
        assert!(cv.experiences.iter().all(|e| e.relevance >= 55));
    }

    #[test]
    fn test_bullets_capped_and_sorted_within_experience() {
        let env = envelope(vec![
            bullet("b1", 0, 60, "sixty"),
            bullet("b2", 0, 90, "ninety"),
            bullet("b3", 0, 75, "seventy-five"),
        ]);
        let opts = BridgeOptions {
            max_bullets_per_experience: 2,
            ..Default::default()
        };
        let cv = convert_widgets_to_cv(&env, &opts);
        assert_eq!(cv.experiences[0].bullets, vec!["ninety", "seventy-five"]);
    }

    #[test]
    fn test_tie_break_preserves_envelope_order() {
        let env = envelope(vec![
            bullet("b1", 0, 80, "first"),
            bullet("b2", 0, 80, "second"),
            bullet("b3", 0, 80, "third"),
        ]);
        let opts = BridgeOptions {
            max_bullets_per_experience: 2,
            ..Default::default()
        };
        let cv = convert_widgets_to_cv(&env, &opts);
        assert_eq!(cv.experiences[0].bullets, vec!["first", "second"]);
    }

    #[test]
    fn test_experience_tie_break_follows_envelope_order() {
        // Equal max scores: the experience whose widgets appear first in the
        // envelope wins, even when its id sorts after the other's.
        let env = envelope(vec![
            header("h5", 5, "First Seen — Alpha"),
            bullet("b1", 5, 80, "bullet for five"),
            header("h1", 1, "Second Seen — Beta"),
            bullet("b2", 1, 80, "bullet for one"),
        ]);
        let cv = convert_widgets_to_cv(&env, &BridgeOptions::default());
        let roles: Vec<&str> = cv.experiences.iter().map(|e| e.role.as_str()).collect();
        assert_eq!(roles, vec!["First Seen", "Second Seen"]);
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let env = envelope(vec![
            header("h0", 0, "Dev — Acme"),
            bullet("b1", 0, 80, "A bullet"),
            bullet("b2", 1, 80, "Another bullet"),
            skill("s1", 70, "Rust"),
        ]);
        let opts = BridgeOptions::default();
        let a = serde_json::to_string(&convert_widgets_to_cv(&env, &opts)).unwrap();
        let b = serde_json::to_string(&convert_widgets_to_cv(&env, &opts)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_header_split_into_role_and_company() {
        let env = envelope(vec![
            header("h0", 0, "Staff Engineer — Initech"),
            bullet("b1", 0, 85, "Shipped things"),
        ]);
        let cv = convert_widgets_to_cv(&env, &BridgeOptions::default());
        assert_eq!(cv.experiences[0].role, "Staff Engineer");
        assert_eq!(cv.experiences[0].company, "Initech");
    }

    #[test]
    fn test_skills_respect_min_score() {
        let env = envelope(vec![
            bullet("b1", 0, 80, "bullet"),
            skill("s1", 90, "Rust"),
            skill("s2", 10, "Cobol"),
        ]);
        let cv = convert_widgets_to_cv(&env, &BridgeOptions::default());
        assert_eq!(cv.competences, vec!["Rust"]);
    }

    #[test]
    fn test_summary_carried_from_envelope() {
        let env = envelope(vec![bullet("b1", 0, 80, "bullet")]);
        let cv = convert_widgets_to_cv(&env, &BridgeOptions::default());
        assert_eq!(cv.profil.summary, "Seasoned backend engineer");
        assert_eq!(cv.profil.title, "Backend Engineer");
    }
}
