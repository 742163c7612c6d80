// AI widgets: the generated content units between the RAG profile and the
// rendered CV. Generation (LLM), envelope validation, grounding checks, and
// the deterministic widget → CV bridge.

pub mod bridge;
pub mod generator;
pub mod grounding;
pub mod models;
pub mod prompts;
