// All LLM prompt constants for the RAG extraction module.

/// System prompt for document extraction — enforces JSON-only output.
pub const EXTRACT_SYSTEM: &str =
    "You are an expert resume and career-document analyst. \
    Extract structured profile information from a raw document. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Extraction prompt template. Replace `{document}` before sending.
pub const EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the candidate's profile from the document below.

Return a JSON object with this EXACT schema (omit fields you cannot find, never invent them):
{
  "profil": {
    "name": "Jane Doe",
    "title": "Backend Engineer",
    "email": "jane@example.com",
    "phone": "+33 6 12 34 56 78",
    "location": "Lyon, France",
    "pitch": "One-paragraph professional summary",
    "linkedin": "linkedin.com/in/janedoe"
  },
  "experiences": [
    {
      "role": "Backend Engineer",
      "company": "Acme",
      "date_start": "2020-03",
      "date_end": "2023-06",
      "technologies": ["Rust", "PostgreSQL"],
      "realisations": [
        {"text": "Reduced API latency by 40% by rewriting the hot path"}
      ]
    }
  ],
  "competences": {
    "technical": [{"name": "Rust"}, {"name": "Kubernetes"}],
    "soft": [{"name": "Mentoring"}]
  },
  "formations": [
    {"degree": "MSc Computer Science", "institution": "INSA Lyon", "year": "2014"}
  ],
  "certifications": [
    {"name": "CKA", "issuer": "CNCF", "year": "2022"}
  ],
  "langues": {"français": "natif", "anglais": "C1"},
  "contexte_enrichi": [
    {"text": "Likely led incident response given on-call ownership claims", "confidence": 70}
  ]
}

Rules:
- Copy facts verbatim where possible; keep every number exactly as written.
- One realisation per achievement bullet; do not merge distinct achievements.
- "contexte_enrichi" is for responsibilities that are strongly implied but not
  stated. Confidence is 60-100; below 60, leave the item out.
- Dates stay in whatever format the document uses.
- Keep the document's language for all free text.

DOCUMENT:
{document}
"#;

/// Builds the final extraction prompt.
pub fn build_extract_prompt(document_text: &str) -> String {
    EXTRACT_PROMPT_TEMPLATE.replace("{document}", document_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_extract_prompt_substitutes_document() {
        let prompt = build_extract_prompt("Jane Doe, Backend Engineer at Acme since 2020");
        assert!(prompt.contains("Jane Doe, Backend Engineer at Acme since 2020"));
        assert!(!prompt.contains("{document}"));
    }
}
