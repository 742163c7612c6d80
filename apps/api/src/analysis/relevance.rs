//! Relevance scoring — measures how well a RAG item matches a parsed job offer.
//!
//! Default backend is the pure keyword scorer: fast, deterministic, no LLM.
//! The trait seam exists so a semantic backend can be swapped in without
//! touching callers; `AppState` would carry it as `Arc<dyn RelevanceScorer>`.

use async_trait::async_trait;

use crate::analysis::offer_parser::JobOfferContext;
use crate::rag::dedup::normalize_tokens;
use crate::rag::models::WeightTag;

/// Neutral score returned when the job offer is empty.
pub const NEUTRAL_SCORE: u8 = 50;

/// Pluggable relevance scorer.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, item_text: &str, weight: Option<WeightTag>, ctx: &JobOfferContext)
        -> u8;
}

/// Pure keyword-overlap scorer — the default backend.
pub struct KeywordRelevanceScorer;

#[async_trait]
impl RelevanceScorer for KeywordRelevanceScorer {
    async fn score(
        &self,
        item_text: &str,
        weight: Option<WeightTag>,
        ctx: &JobOfferContext,
    ) -> u8 {
        score_relevance(item_text, weight, ctx)
    }
}

/// Scores a single item 0–100 against the offer context.
///
/// Combines weighted keyword overlap (60%) with skill-token overlap (40%),
/// then applies the user weight boost. An empty offer yields the neutral 50
/// for every item — never an error.
pub fn score_relevance(item_text: &str, weight: Option<WeightTag>, ctx: &JobOfferContext) -> u8 {
    if ctx.is_empty || ctx.keyword_inventory.is_empty() {
        return NEUTRAL_SCORE;
    }

    let item_tokens = normalize_tokens(item_text);
    if item_tokens.is_empty() {
        return apply_weight_boost(0, weight);
    }

    // Keyword overlap: matched weighted score over total weighted score.
    let total_weight: f32 = ctx
        .keyword_inventory
        .iter()
        .map(|k| k.weighted_score)
        .sum();
    let matched_weight: f32 = ctx
        .keyword_inventory
        .iter()
        .filter(|k| item_tokens.contains(&k.keyword))
        .map(|k| k.weighted_score)
        .sum();
    let keyword_overlap = if total_weight > 0.0 {
        matched_weight / total_weight
    } else {
        0.0
    };

    // Skill overlap: fraction of offer skill tokens present in the item.
    let skill_overlap = if ctx.skill_tokens.is_empty() {
        keyword_overlap
    } else {
        let matched = ctx
            .skill_tokens
            .iter()
            .filter(|s| item_tokens.contains(*s))
            .count();
        matched as f32 / ctx.skill_tokens.len() as f32
    };

    // Overlap fractions are small for realistic bullets (a bullet matches a
    // handful of the offer's many keywords), so the scale is stretched before
    // clamping: full marks do not require matching the entire offer.
    let combined = (0.6 * keyword_overlap + 0.4 * skill_overlap) * 2.5;
    let base = (combined.min(1.0) * 100.0).round() as i16;

    apply_weight_boost(base, weight)
}

fn apply_weight_boost(base: i16, weight: Option<WeightTag>) -> u8 {
    let boosted = match weight {
        Some(WeightTag::Important) => base + 15,
        Some(WeightTag::Inclus) => base,
        Some(WeightTag::Exclu) => base - 40,
        None => base,
    };
    boosted.clamp(0, 100) as u8
}
