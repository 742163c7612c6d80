//! Widget generation — one LLM call turning (RAG profile, job offer) into a
//! validated widgets envelope.
//!
//! The generator either returns a schema-valid envelope or a typed error;
//! callers never see a half-parsed envelope.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{strip_json_fences, LlmClient, LlmError, MODEL};
use crate::rag::models::RagProfile;
use crate::widgets::models::WidgetsEnvelope;
use crate::widgets::prompts::{build_widget_prompt, WIDGET_SYSTEM};

/// Max LLM retries when the model returns output that fails schema validation.
const MAX_SCHEMA_RETRIES: u32 = 1;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM call failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("LLM output is not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("envelope failed schema validation: {violations:?}")]
    SchemaInvalid { violations: Vec<String> },
}

/// Parses raw LLM text into a validated envelope.
///
/// Tolerates markdown code fences around the JSON. Any schema violation
/// rejects the whole envelope; there is no partial acceptance.
pub fn parse_envelope(raw: &str) -> Result<WidgetsEnvelope, GenerationError> {
    let text = strip_json_fences(raw);
    let envelope: WidgetsEnvelope = serde_json::from_str(text)?;
    envelope
        .validate()
        .map_err(|violations| GenerationError::SchemaInvalid { violations })?;
    Ok(envelope)
}

/// Generates the widgets envelope for one (profile, job offer) pair.
///
/// `meta` is always overwritten server-side: the model never gets to claim
/// a different model name or timestamp than the call that produced it.
pub async fn generate_widgets(
    llm: &LlmClient,
    profile: &RagProfile,
    job_offer_text: &str,
) -> Result<WidgetsEnvelope, GenerationError> {
    let profile_json = serde_json::to_string(profile)?;
    let prompt = build_widget_prompt(&profile_json, job_offer_text);

    let mut last_error: Option<GenerationError> = None;

    for attempt in 0..=MAX_SCHEMA_RETRIES {
        let raw = llm.call_text(&prompt, WIDGET_SYSTEM).await?;

        match parse_envelope(&raw) {
            Ok(mut envelope) => {
                envelope.meta.model = MODEL.to_string();
                envelope.meta.created_at = Some(Utc::now());
                info!(
                    widgets = envelope.widgets.len(),
                    attempt, "widget generation succeeded"
                );
                return Ok(envelope);
            }
            Err(e) => {
                warn!(attempt, error = %e, "widget envelope rejected");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(GenerationError::SchemaInvalid {
        violations: vec!["no envelope produced".to_string()],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ENVELOPE: &str = r#"{
        "profil_summary": "Backend engineer with ten years of experience.",
        "job_context": {"company": "Acme", "title": "Backend Engineer", "match_score": 78},
        "widgets": [
            {
                "id": "w1",
                "type": "experience_bullet",
                "section": "experiences",
                "text": "Reduced API latency by 40%",
                "relevance_score": 85,
                "sources": {"rag_experience_id": 0}
            }
        ],
        "meta": {}
    }"#;

    #[test]
    fn test_parse_plain_json_envelope() {
        let envelope = parse_envelope(VALID_ENVELOPE).unwrap();
        assert_eq!(envelope.widgets.len(), 1);
        assert_eq!(envelope.job_context.company, "Acme");
    }

    #[test]
    fn test_parse_tolerates_json_fences() {
        let fenced = format!("```json\n{VALID_ENVELOPE}\n```");
        let envelope = parse_envelope(&fenced).unwrap();
        assert_eq!(envelope.widgets[0].id, "w1");
    }

    #[test]
    fn test_parse_tolerates_bare_fences() {
        let fenced = format!("```\n{VALID_ENVELOPE}\n```");
        assert!(parse_envelope(&fenced).is_ok());
    }

    #[test]
    fn test_empty_widgets_array_is_schema_invalid() {
        let raw = r#"{"profil_summary": "s", "job_context": {}, "widgets": [], "meta": {}}"#;
        match parse_envelope(raw) {
            Err(GenerationError::SchemaInvalid { violations }) => {
                assert!(violations[0].contains("empty"));
            }
            other => panic!("expected SchemaInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_prose_output_is_malformed() {
        let raw = "Sure! Here is your resume content: lots of prose.";
        assert!(matches!(
            parse_envelope(raw),
            Err(GenerationError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_bullet_without_source_is_schema_invalid() {
        let raw = r#"{
            "profil_summary": "s",
            "job_context": {},
            "widgets": [
                {"id": "w1", "type": "experience_bullet", "section": "experiences",
                 "text": "Did things", "relevance_score": 70, "sources": {}}
            ],
            "meta": {}
        }"#;
        assert!(matches!(
            parse_envelope(raw),
            Err(GenerationError::SchemaInvalid { .. })
        ));
    }
}
