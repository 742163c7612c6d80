//! RAG deduplication — collapses near-duplicate items extracted from multiple
//! uploaded documents using Jaccard similarity over normalized word tokens.
//!
//! Pure function over the input profile: no I/O, no mutation of the argument.
//! Malformed or empty sections pass through untouched. The richer (longer) item
//! of a duplicate pair is retained; weight tags merge max-wins.

use std::collections::BTreeSet;

use crate::rag::models::{
    merge_weight, Competences, Experience, RagProfile, Realisation, SkillItem,
};

/// Default similarity threshold. 0.75–0.80 balances false positives and false
/// negatives better than a naive 0.85 on noisy extracted data; the live value
/// comes from `Config::dedup_similarity_threshold`.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.78;

/// Normalizes text into a token set for comparison: diacritics folded,
/// lowercased, punctuation stripped, tokens of ≤2 characters dropped.
pub fn normalize_tokens(text: &str) -> BTreeSet<String> {
    text.chars()
        .map(fold_diacritic)
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(|w| w.to_string())
        .collect()
}

/// Folds common Latin diacritics to their ASCII base character. Profiles are
/// frequently French, so the accented vowels and ç dominate in practice.
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' | 'ì' => 'i',
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => 'o',
        'û' | 'ü' | 'ú' | 'ù' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ÿ' => 'y',
        'À' | 'Â' | 'Ä' | 'Á' | 'Ã' | 'Å' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Î' | 'Ï' | 'Í' | 'Ì' => 'I',
        'Ô' | 'Ö' | 'Ó' | 'Ò' | 'Õ' => 'O',
        'Û' | 'Ü' | 'Ú' | 'Ù' => 'U',
        'Ç' => 'C',
        other => other,
    }
}

/// Jaccard similarity of two token sets. Empty ∪ empty → 0.0.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Token-level similarity of two text fragments.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    jaccard(&normalize_tokens(a), &normalize_tokens(b))
}

/// Deduplicates every list-valued section of a RAG profile.
///
/// Sections covered: experiences, realisations within each experience,
/// technical and soft skills, formations, certifications.
pub fn deduplicate_rag(profile: &RagProfile, threshold: f64) -> RagProfile {
    let mut out = profile.clone();

    out.experiences = dedup_experiences(&out.experiences, threshold);
    for exp in &mut out.experiences {
        exp.realisations = dedup_realisations(&exp.realisations, threshold);
    }
    out.competences = Competences {
        technical: dedup_skills(&out.competences.technical, threshold),
        soft: dedup_skills(&out.competences.soft, threshold),
    };
    out.formations = dedup_by_text(&out.formations, threshold, |f| f.combined_text());
    out.certifications = dedup_by_text(&out.certifications, threshold, |c| c.combined_text());

    out
}

fn dedup_experiences(experiences: &[Experience], threshold: f64) -> Vec<Experience> {
    let mut kept: Vec<Experience> = Vec::new();

    for candidate in experiences {
        let cand_tokens = normalize_tokens(&candidate.combined_text());
        let duplicate_of = kept
            .iter()
            .position(|k| jaccard(&normalize_tokens(&k.combined_text()), &cand_tokens) >= threshold);

        match duplicate_of {
            Some(i) => {
                // Retain the richer experience, then fold weight tags from the
                // dropped one into matching realisations of the survivor.
                let richer_is_candidate =
                    candidate.combined_text().len() > kept[i].combined_text().len();
                let (survivor, dropped) = if richer_is_candidate {
                    let dropped = std::mem::replace(&mut kept[i], candidate.clone());
                    (&mut kept[i], dropped)
                } else {
                    (&mut kept[i], candidate.clone())
                };
                merge_realisation_weights(&mut survivor.realisations, &dropped.realisations, threshold);
            }
            None => kept.push(candidate.clone()),
        }
    }

    kept
}

/// Carries weight tags from dropped realisations onto matching survivors.
fn merge_realisation_weights(
    survivors: &mut [Realisation],
    dropped: &[Realisation],
    threshold: f64,
) {
    for d in dropped {
        if d.weight.is_none() {
            continue;
        }
        for s in survivors.iter_mut() {
            if text_similarity(&s.text, &d.text) >= threshold {
                s.weight = merge_weight(s.weight, d.weight);
                break;
            }
        }
    }
}

fn dedup_realisations(realisations: &[Realisation], threshold: f64) -> Vec<Realisation> {
    let mut kept: Vec<Realisation> = Vec::new();

    for candidate in realisations {
        let duplicate_of = kept
            .iter()
            .position(|k| text_similarity(&k.text, &candidate.text) >= threshold);

        match duplicate_of {
            Some(i) => {
                let merged_weight = merge_weight(kept[i].weight, candidate.weight);
                if candidate.text.len() > kept[i].text.len() {
                    kept[i].text = candidate.text.clone();
                }
                kept[i].weight = merged_weight;
            }
            None => kept.push(candidate.clone()),
        }
    }

    kept
}

fn dedup_skills(skills: &[SkillItem], threshold: f64) -> Vec<SkillItem> {
    let mut kept: Vec<SkillItem> = Vec::new();

    for candidate in skills {
        let cand_tokens = normalize_tokens(&candidate.name);
        let duplicate_of = kept.iter().position(|k| {
            // Short skill names ("Go", "C#") produce empty token sets; fall
            // back to case-insensitive equality for those.
            if cand_tokens.is_empty() {
                k.name.eq_ignore_ascii_case(&candidate.name)
            } else {
                jaccard(&normalize_tokens(&k.name), &cand_tokens) >= threshold
            }
        });

        match duplicate_of {
            Some(i) => {
                let merged_weight = merge_weight(kept[i].weight, candidate.weight);
                if candidate.name.len() > kept[i].name.len() {
                    kept[i].name = candidate.name.clone();
                }
                kept[i].weight = merged_weight;
            }
            None => kept.push(candidate.clone()),
        }
    }

    kept
}

fn dedup_by_text<T: Clone>(items: &[T], threshold: f64, text_of: impl Fn(&T) -> String) -> Vec<T> {
    let mut kept: Vec<T> = Vec::new();

    for candidate in items {
        let cand_text = text_of(candidate);
        let duplicate_of = kept
            .iter()
            .position(|k| text_similarity(&text_of(k), &cand_text) >= threshold);

        match duplicate_of {
            Some(i) => {
                if cand_text.len() > text_of(&kept[i]).len() {
                    kept[i] = candidate.clone();
                }
            }
            None => kept.push(candidate.clone()),
        }
    }

    kept
}
