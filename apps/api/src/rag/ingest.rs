//! Document ingestion — raw upload → text extraction → LLM structuring →
//! merge into the existing profile.
//!
//! Ingestion is additive: a new document can only add or upgrade information,
//! never silently drop what earlier documents contributed. The dedup pass
//! after merging is what keeps re-uploads idempotent.

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::rag::dedup::{deduplicate_rag, text_similarity};
use crate::rag::models::{InferredItem, InferredStatus, RagProfile};
use crate::rag::prompts::{build_extract_prompt, EXTRACT_SYSTEM};
use crate::rag::storage::{get_profile, save_profile};

/// How the raw text was obtained from the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    PdfText,
    PlainText,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub method: ExtractionMethod,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub extraction_method: ExtractionMethod,
    pub quality_score: u8,
    pub experiences: usize,
    pub technical_skills: usize,
    pub inferred_items: usize,
}

/// Extracts plain text from an uploaded document.
/// PDFs go through text extraction; anything else is treated as UTF-8 text.
pub fn extract_text(filename: &str, data: &[u8]) -> Result<ExtractedText, AppError> {
    let is_pdf = filename.to_ascii_lowercase().ends_with(".pdf")
        || data.starts_with(b"%PDF-");

    let extracted = if is_pdf {
        let text = pdf_extract::extract_text_from_mem(data).map_err(|e| {
            AppError::Validation(format!("could not extract text from PDF: {e}"))
        })?;
        ExtractedText {
            text,
            method: ExtractionMethod::PdfText,
        }
    } else {
        ExtractedText {
            text: String::from_utf8_lossy(data).into_owned(),
            method: ExtractionMethod::PlainText,
        }
    };

    if extracted.text.trim().is_empty() {
        return Err(AppError::Validation(
            "document contains no extractable text".to_string(),
        ));
    }
    Ok(extracted)
}

/// Runs the extraction LLM call and sanitizes its output.
pub async fn extract_profile(llm: &LlmClient, text: &str) -> Result<RagProfile, AppError> {
    let prompt = build_extract_prompt(text);
    let mut profile: RagProfile = llm.call_json(&prompt, EXTRACT_SYSTEM).await?;
    sanitize_inferred(&mut profile);
    Ok(profile)
}

/// Inferred items always enter the profile as pending, with confidence
/// clamped to the 60–100 band the prompt promises.
fn sanitize_inferred(profile: &mut RagProfile) {
    profile.contexte_enrichi.retain(|item| item.confidence >= 60);
    for item in &mut profile.contexte_enrichi {
        item.confidence = item.confidence.min(100);
        item.status = InferredStatus::Pending;
    }
}

/// Merges a freshly extracted profile into the existing one.
///
/// Header fields keep the existing value when present (the user may have
/// corrected them); list sections are concatenated and deduplicated.
pub fn merge_profiles(existing: &RagProfile, incoming: &RagProfile, threshold: f64) -> RagProfile {
    let mut merged = existing.clone();

    let header = &mut merged.profil;
    let new = &incoming.profil;
    if header.name.is_empty() {
        header.name = new.name.clone();
    }
    if header.title.is_empty() {
        header.title = new.title.clone();
    }
    merge_opt(&mut header.email, &new.email);
    merge_opt(&mut header.phone, &new.phone);
    merge_opt(&mut header.location, &new.location);
    merge_opt(&mut header.pitch, &new.pitch);
    merge_opt(&mut header.photo_url, &new.photo_url);
    merge_opt(&mut header.linkedin, &new.linkedin);

    merged.experiences.extend(incoming.experiences.iter().cloned());
    merged
        .competences
        .technical
        .extend(incoming.competences.technical.iter().cloned());
    merged
        .competences
        .soft
        .extend(incoming.competences.soft.iter().cloned());
    merged.formations.extend(incoming.formations.iter().cloned());
    merged
        .certifications
        .extend(incoming.certifications.iter().cloned());
    for (lang, level) in &incoming.langues {
        merged
            .langues
            .entry(lang.clone())
            .or_insert_with(|| level.clone());
    }
    merged
        .contexte_enrichi
        .extend(incoming.contexte_enrichi.iter().cloned());
    merged.contexte_enrichi = dedup_inferred(&merged.contexte_enrichi, threshold);

    deduplicate_rag(&merged, threshold)
}

/// Collapses near-identical inferred items. A reviewed status (validated or
/// rejected) survives over a fresh pending copy; confidence keeps the max.
fn dedup_inferred(items: &[InferredItem], threshold: f64) -> Vec<InferredItem> {
    let mut kept: Vec<InferredItem> = Vec::new();
    for candidate in items {
        match kept
            .iter_mut()
            .find(|k| text_similarity(&k.text, &candidate.text) >= threshold)
        {
            Some(existing) => {
                existing.confidence = existing.confidence.max(candidate.confidence);
                if existing.status == InferredStatus::Pending {
                    existing.status = candidate.status;
                }
            }
            None => kept.push(candidate.clone()),
        }
    }
    kept
}

fn merge_opt(existing: &mut Option<String>, incoming: &Option<String>) {
    if existing.as_deref().map_or(true, str::is_empty) {
        existing.clone_from(incoming);
    }
}

/// Full ingestion path: extract text, structure it, merge, persist.
pub async fn ingest_document(
    llm: &LlmClient,
    pool: &PgPool,
    user_id: Uuid,
    filename: &str,
    data: &[u8],
    dedup_threshold: f64,
) -> Result<IngestResponse, AppError> {
    let extracted = extract_text(filename, data)?;
    info!(
        %user_id,
        filename,
        method = ?extracted.method,
        chars = extracted.text.len(),
        "document text extracted"
    );

    let incoming = extract_profile(llm, &extracted.text).await?;

    let existing = get_profile(pool, user_id)
        .await?
        .map(|row| row.profile.0)
        .unwrap_or_default();
    let merged = merge_profiles(&existing, &incoming, dedup_threshold);

    let quality_score = save_profile(pool, user_id, &merged).await?;

    Ok(IngestResponse {
        extraction_method: extracted.method,
        quality_score,
        experiences: merged.experiences.len(),
        technical_skills: merged.competences.technical.len(),
        inferred_items: merged.contexte_enrichi.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::dedup::DEFAULT_SIMILARITY_THRESHOLD;
    use crate::rag::models::{Experience, InferredItem, Realisation, SkillItem};

    #[test]
    fn test_extract_text_plain_utf8() {
        let extracted = extract_text("cv.txt", "Jane Doe\nBackend Engineer".as_bytes()).unwrap();
        assert_eq!(extracted.method, ExtractionMethod::PlainText);
        assert!(extracted.text.contains("Jane Doe"));
    }

    #[test]
    fn test_extract_text_rejects_empty_document() {
        assert!(extract_text("cv.txt", b"   \n ").is_err());
    }

    #[test]
    fn test_merge_keeps_existing_header_values() {
        let mut existing = RagProfile::default();
        existing.profil.name = "Jane Doe".to_string();
        existing.profil.email = Some("jane@old.example".to_string());
        let mut incoming = RagProfile::default();
        incoming.profil.name = "J. Doe".to_string();
        incoming.profil.email = Some("jane@new.example".to_string());
        incoming.profil.phone = Some("+33 6 00 00 00 00".to_string());

        let merged = merge_profiles(&existing, &incoming, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(merged.profil.name, "Jane Doe");
        assert_eq!(merged.profil.email.as_deref(), Some("jane@old.example"));
        // Missing fields are filled from the new document.
        assert_eq!(merged.profil.phone.as_deref(), Some("+33 6 00 00 00 00"));
    }

    #[test]
    fn test_merge_appends_new_experiences() {
        let existing = RagProfile {
            experiences: vec![Experience {
                role: "Backend Engineer".to_string(),
                company: "Acme".to_string(),
                realisations: vec![Realisation::new("Built the billing pipeline")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let incoming = RagProfile {
            experiences: vec![Experience {
                role: "Data Engineer".to_string(),
                company: "Globex".to_string(),
                realisations: vec![Realisation::new("Migrated the warehouse to Iceberg")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let merged = merge_profiles(&existing, &incoming, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(merged.experiences.len(), 2);
    }

    #[test]
    fn test_reingesting_same_document_is_idempotent() {
        let profile = RagProfile {
            experiences: vec![Experience {
                role: "Backend Engineer".to_string(),
                company: "Acme".to_string(),
                realisations: vec![Realisation::new(
                    "Reduced API latency by 40% by rewriting the hot path",
                )],
                ..Default::default()
            }],
            competences: crate::rag::models::Competences {
                technical: vec![SkillItem::new("Rust")],
                soft: vec![],
            },
            ..Default::default()
        };
        let merged = merge_profiles(&profile, &profile, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(merged.experiences.len(), 1);
        assert_eq!(merged.competences.technical.len(), 1);
    }

    #[test]
    fn test_sanitize_drops_low_confidence_and_resets_status() {
        let mut profile = RagProfile {
            contexte_enrichi: vec![
                InferredItem {
                    text: "Owns incident response".to_string(),
                    confidence: 80,
                    status: InferredStatus::Validated,
                },
                InferredItem {
                    text: "Probably speaks German".to_string(),
                    confidence: 30,
                    status: InferredStatus::Pending,
                },
            ],
            ..Default::default()
        };
        sanitize_inferred(&mut profile);
        assert_eq!(profile.contexte_enrichi.len(), 1);
        assert_eq!(profile.contexte_enrichi[0].status, InferredStatus::Pending);
    }
}
