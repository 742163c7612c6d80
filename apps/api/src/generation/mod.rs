// CV generation: the pipeline gluing profile, analysis, widgets, and fitter
// together, plus its idempotency cache and persistence.
// All LLM calls go through llm_client — no direct Gemini calls here.

pub mod cache;
pub mod handlers;
pub mod models;
pub mod pipeline;
