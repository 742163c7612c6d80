//! Template fitter — compresses a résumé until it fits one physical page.
//!
//! The fitter walks a global compression level upward. At level `l`, the
//! experience with ascending-relevance rank `r` receives `l - r` demotion
//! steps (floored at zero), so the least relevant experience always degrades
//! first and the most relevant degrades last. Steps map onto the format
//! ladder: 1 = standard, 2 = compact, 3 = minimal, 4+ = excluded from the
//! page. The first level whose estimated height fits the page budget wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fitter::catalog::TemplateSpec;
use crate::fitter::height::estimate_height;
use crate::render::schema::{ExperienceFormat, RendererExperience, RendererResume};

/// Diagnostics attached to every fit result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitStats {
    pub estimated_height_mm: f32,
    pub page_budget_mm: f32,
    /// Format label → number of experiences rendered in it ("excluded" counts
    /// experiences dropped from the page).
    pub formats_used: BTreeMap<String, usize>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub cv_data: RendererResume,
    pub compression_level_applied: u32,
    /// Set when even the maximum level leaves the estimate over budget.
    pub dense: bool,
    pub unit_stats: UnitStats,
}

/// Demotion steps for one experience at a global level.
fn steps_for(level: u32, rank: u32) -> u32 {
    level.saturating_sub(rank)
}

/// Format after `steps` demotions, `None` once the experience falls off the
/// bottom of the ladder.
fn format_after(steps: u32) -> Option<ExperienceFormat> {
    if steps > 3 {
        return None; // excluded
    }
    let mut format = ExperienceFormat::Detailed;
    for _ in 0..steps {
        format = format.demote();
    }
    Some(format)
}

/// Applies one compression level to the résumé. Returns the compressed copy
/// and the number of excluded experiences.
///
/// `ranks[i]` is the ascending-relevance rank of `experiences[i]`. The
/// top-ranked experience never drops below minimal, so the page always keeps
/// at least one experience.
fn apply_level(
    resume: &RendererResume,
    ranks: &[u32],
    level: u32,
) -> (RendererResume, usize) {
    let top_rank = ranks.iter().copied().max().unwrap_or(0);
    let mut out = resume.clone();
    let mut kept = Vec::with_capacity(out.experiences.len());
    let mut excluded = 0usize;

    for (i, mut exp) in out.experiences.drain(..).enumerate() {
        let steps = steps_for(level, ranks[i]);
        match format_after(steps) {
            Some(format) => {
                exp.format = format;
                exp.bullets.truncate(format.bullet_cap());
                kept.push(exp);
            }
            None if ranks[i] == top_rank => {
                exp.format = ExperienceFormat::Minimal;
                exp.bullets.clear();
                kept.push(exp);
            }
            None => excluded += 1,
        }
    }

    out.experiences = kept;
    (out, excluded)
}

/// Ascending-relevance ranks, stable on ties (earlier experiences rank lower
/// and therefore degrade first among equals).
fn relevance_ranks(experiences: &[RendererExperience]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..experiences.len()).collect();
    order.sort_by_key(|&i| experiences[i].relevance);
    let mut ranks = vec![0u32; experiences.len()];
    for (rank, &i) in order.iter().enumerate() {
        ranks[i] = rank as u32;
    }
    ranks
}

fn formats_histogram(resume: &RendererResume, excluded: usize) -> BTreeMap<String, usize> {
    let mut hist = BTreeMap::new();
    for exp in &resume.experiences {
        *hist.entry(exp.format.label().to_string()).or_insert(0) += 1;
    }
    if excluded > 0 {
        *hist.entry("excluded".to_string()).or_insert(0) += excluded;
    }
    hist
}

/// Every level above zero shortens content, so every level above zero leaves a
/// warning. The warnings are the caller-facing record of what was cut; the loss
/// report complements them but does not replace them.
fn compression_warnings(level: u32, resume: &RendererResume, excluded: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    if level > 0 {
        let shortened = resume
            .experiences
            .iter()
            .filter(|e| e.format != ExperienceFormat::Detailed)
            .count();
        if shortened > 0 {
            warnings.push(format!(
                "{shortened} experience(s) shortened at compression level {level}"
            ));
        }
    }
    if excluded > 0 {
        warnings.push(format!("{excluded} experience(s) excluded to fit one page"));
    }
    warnings
}

/// Fits the résumé to a single page of the given template.
///
/// Tries compression levels from 0 upward and returns the first that fits.
/// The maximum level is `n + 3` (enough to push every experience to its
/// floor); if that still overflows, the result is returned as-is with the
/// `dense` flag set and a warning recorded.
pub fn fit_to_template(resume: &RendererResume, spec: &TemplateSpec) -> FitResult {
    let budget = spec.page_budget_mm();
    let n = resume.experiences.len() as u32;
    let max_level = n + 3;
    let ranks = relevance_ranks(&resume.experiences);

    let mut last: Option<(RendererResume, usize, f32, u32)> = None;

    for level in 0..=max_level {
        let (candidate, excluded) = apply_level(resume, &ranks, level);
        let height = estimate_height(&candidate, spec);
        debug!(
            template = spec.name,
            level,
            height_mm = height,
            budget_mm = budget,
            excluded,
            "fit attempt"
        );

        if height <= budget {
            let warnings = compression_warnings(level, &candidate, excluded);
            return FitResult {
                unit_stats: UnitStats {
                    estimated_height_mm: height,
                    page_budget_mm: budget,
                    formats_used: formats_histogram(&candidate, excluded),
                    warnings,
                },
                cv_data: candidate,
                compression_level_applied: level,
                dense: false,
            };
        }
        last = Some((candidate, excluded, height, level));
    }

    // Exhausted the ladder; ship the most compressed version and flag it.
    let (candidate, excluded, height, level) =
        last.expect("level 0 always runs");
    let mut warnings = vec![format!(
        "content still exceeds the page budget by {:.1}mm at maximum compression",
        height - budget
    )];
    warnings.extend(compression_warnings(level, &candidate, excluded));
    FitResult {
        unit_stats: UnitStats {
            estimated_height_mm: height,
            page_budget_mm: budget,
            formats_used: formats_histogram(&candidate, excluded),
            warnings,
        },
        cv_data: candidate,
        compression_level_applied: level,
        dense: true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::fitter::catalog::get_template;
    use crate::render::schema::RendererProfil;

    fn make_experience(relevance: u8, bullet_count: usize) -> RendererExperience {
        RendererExperience {
            role: "Engineer".to_string(),
            company: "Acme".to_string(),
            period: Some("2020 - 2023".to_string()),
            bullets: (0..bullet_count)
                .map(|i| {
                    format!(
                        "Delivered a meaningful outcome number {i} across several \
                         teams with measurable production impact"
                    )
                })
                .collect(),
            format: ExperienceFormat::Detailed,
            relevance,
        }
    }

    fn make_resume(experiences: Vec<RendererExperience>) -> RendererResume {
        RendererResume {
            profil: RendererProfil {
                title: "Backend Engineer".to_string(),
                summary: "Ten years building backend systems at scale.".to_string(),
                ..Default::default()
            },
            experiences,
            competences: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            formations: vec!["MSc Computer Science".to_string()],
            langues: BTreeMap::new(),
        }
    }

    #[test]
    fn test_small_resume_fits_at_level_zero() {
        let resume = make_resume(vec![make_experience(90, 2)]);
        let result = fit_to_template(&resume, get_template("classic").unwrap());
        assert_eq!(result.compression_level_applied, 0);
        assert!(!result.dense);
        assert_eq!(result.cv_data.experiences[0].format, ExperienceFormat::Detailed);
    }

    #[test]
    fn test_empty_experiences_passes_through() {
        let resume = make_resume(vec![]);
        let result = fit_to_template(&resume, get_template("classic").unwrap());
        assert_eq!(result.compression_level_applied, 0);
        assert_eq!(result.cv_data.experiences.len(), 0);
        assert!(result.unit_stats.warnings.is_empty());
    }

    #[test]
    fn test_lowest_relevance_demoted_first() {
        // Enough content to force at least one compression step.
        let resume = make_resume(vec![
            make_experience(95, 5),
            make_experience(40, 5),
            make_experience(70, 5),
            make_experience(85, 5),
            make_experience(60, 5),
            make_experience(75, 5),
        ]);
        let result = fit_to_template(&resume, get_template("classic").unwrap());
        assert!(result.compression_level_applied > 0);

        // Order is preserved; degradation follows relevance, not position.
        let by_relevance: Vec<(u8, ExperienceFormat)> = result
            .cv_data
            .experiences
            .iter()
            .map(|e| (e.relevance, e.format))
            .collect();
        for (rel_a, fmt_a) in &by_relevance {
            for (rel_b, fmt_b) in &by_relevance {
                if rel_a > rel_b {
                    // Higher relevance never renders in a worse format.
                    assert!(
                        fmt_a.bullet_cap() >= fmt_b.bullet_cap(),
                        "relevance {rel_a} got {fmt_a:?} but {rel_b} got {fmt_b:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_fitted_height_within_budget_unless_dense() {
        let resume = make_resume((0..8).map(|i| make_experience(30 + i * 8, 5)).collect());
        let spec = get_template("classic").unwrap();
        let result = fit_to_template(&resume, spec);
        if !result.dense {
            assert!(result.unit_stats.estimated_height_mm <= result.unit_stats.page_budget_mm);
        }
    }

    #[test]
    fn test_eight_experiences_degrade_not_truncate_blindly() {
        // Eight rich experiences cannot fit one A4 page fully detailed. The
        // fitter must compress progressively: the most relevant experience
        // keeps the best surviving format and any exclusions hit the least
        // relevant ones.
        let relevances = [95u8, 88, 82, 76, 70, 55, 45, 35];
        let resume = make_resume(
            relevances.iter().map(|&r| make_experience(r, 5)).collect(),
        );
        let spec = get_template("classic").unwrap();
        let result = fit_to_template(&resume, spec);

        assert!(result.compression_level_applied > 0);
        assert!(!result.dense);
        assert!(result.unit_stats.estimated_height_mm <= result.unit_stats.page_budget_mm);

        // The top experience survives with the best format on the page.
        let top = result
            .cv_data
            .experiences
            .iter()
            .max_by_key(|e| e.relevance)
            .expect("top experience kept");
        assert_eq!(top.relevance, 95);
        assert!(result
            .cv_data
            .experiences
            .iter()
            .all(|e| e.format.bullet_cap() <= top.format.bullet_cap()));

        // Any exclusion removed strictly lower-relevance experiences.
        let kept_min = result
            .cv_data
            .experiences
            .iter()
            .map(|e| e.relevance)
            .min()
            .unwrap();
        let excluded = relevances.len() - result.cv_data.experiences.len();
        if excluded > 0 {
            assert!(relevances
                .iter()
                .filter(|&&r| r < kept_min)
                .count() == excluded);
            assert_eq!(
                result.unit_stats.formats_used.get("excluded"),
                Some(&excluded)
            );
        }
    }

    #[test]
    fn test_demotion_only_fit_still_records_warning() {
        // Fits after demoting the two least relevant experiences, with nothing
        // excluded. Shortening without a trace is not allowed: the caller must
        // see a warning even when every experience stayed on the page.
        let resume = make_resume(vec![
            make_experience(90, 3),
            make_experience(80, 3),
            make_experience(70, 3),
            make_experience(60, 3),
            make_experience(50, 3),
        ]);
        let result = fit_to_template(&resume, get_template("classic").unwrap());

        assert!(result.compression_level_applied > 0);
        assert!(!result.dense);
        assert!(result.unit_stats.formats_used.get("excluded").is_none());
        assert!(
            !result.unit_stats.warnings.is_empty(),
            "demotion-only compression must leave a warning"
        );
    }

    #[test]
    fn test_dense_flag_when_nothing_fits() {
        // A summary so long it alone overflows the page.
        let mut resume = make_resume(vec![make_experience(90, 5)]);
        resume.profil.summary = "word ".repeat(4000);
        let result = fit_to_template(&resume, get_template("classic").unwrap());
        assert!(result.dense);
        assert!(!result.unit_stats.warnings.is_empty());
        assert!(result.unit_stats.estimated_height_mm > result.unit_stats.page_budget_mm);
    }

    #[test]
    fn test_top_experience_never_excluded() {
        let mut resume = make_resume(vec![make_experience(90, 5), make_experience(20, 5)]);
        resume.profil.summary = "word ".repeat(4000);
        let result = fit_to_template(&resume, get_template("classic").unwrap());
        // Even at maximum compression the best experience stays on the page.
        assert!(result
            .cv_data
            .experiences
            .iter()
            .any(|e| e.relevance == 90));
    }

    #[test]
    fn test_formats_histogram_counts_everything() {
        let resume = make_resume((0..8).map(|i| make_experience(30 + i * 8, 5)).collect());
        let result = fit_to_template(&resume, get_template("classic").unwrap());
        let total: usize = result.unit_stats.formats_used.values().sum();
        assert_eq!(total, 8);
    }
}
