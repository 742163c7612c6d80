// RAG profile: the user's canonical knowledge base.
// Ingestion (PDF/text → LLM extraction), merge + dedup, quality scoring,
// weight tags, and inferred-item review.

pub mod dedup;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod prompts;
pub mod quality;
pub mod storage;
