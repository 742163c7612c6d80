// All LLM prompt constants for the widget generation module.

/// System prompt for widget generation — enforces JSON-only output.
pub const WIDGET_SYSTEM: &str =
    "You are an expert resume writer and career strategist. \
    Generate tailored resume content for a specific job offer, strictly \
    grounded in the candidate profile you are given. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Widget generation prompt template.
/// Replace `{rag_profile}` and `{job_offer}` before sending.
pub const WIDGET_PROMPT_TEMPLATE: &str = r#"Generate resume widgets tailored to the job offer below, using ONLY facts from the candidate profile.

Return a JSON object with this EXACT schema (no extra fields):
{
  "profil_summary": "Two-sentence professional summary tailored to this job",
  "job_context": {
    "company": "Acme",
    "title": "Backend Engineer",
    "match_score": 78
  },
  "widgets": [
    {
      "id": "w1",
      "type": "experience_bullet",
      "section": "experiences",
      "text": "Reduced API latency by 40% by rewriting the hot path in Rust",
      "relevance_score": 85,
      "sources": {"rag_experience_id": 0, "rag_realisation_id": 2}
    }
  ],
  "meta": {}
}

Widget types: "summary_block", "experience_header", "experience_bullet", "skill_item", "education_item", "project_item".
Sections: "summary", "experiences", "skills", "education", "projects".

Rules:
- Every experience gets one "experience_header" widget with text "Role — Company" and its "rag_experience_id".
- Every "experience_bullet" MUST carry "sources.rag_experience_id" pointing at the profile experience it came from (0-based index).
- relevance_score is 0-100: how useful this widget is FOR THIS JOB specifically.
- NEVER invent numbers. Any figure ("40%", "12 people", "3.5M") must appear verbatim in the profile.
- NEVER list a skill the profile does not contain.
- Prefer rephrasing real achievements with the job offer's own vocabulary over generic wording.
- Weight tags in the profile: items marked "important" deserve high relevance_score, items marked "exclu" must NOT produce widgets.

CANDIDATE PROFILE (JSON):
{rag_profile}

JOB OFFER:
{job_offer}
"#;

/// Builds the final widget generation prompt.
pub fn build_widget_prompt(rag_profile_json: &str, job_offer_text: &str) -> String {
    WIDGET_PROMPT_TEMPLATE
        .replace("{rag_profile}", rag_profile_json)
        .replace("{job_offer}", job_offer_text)
}
