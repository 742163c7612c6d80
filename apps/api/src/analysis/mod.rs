// Job analyses: heuristic offer parsing, relevance scoring, and
// application-status tracking. No LLM calls in this module — parsing and
// scoring stay fast and deterministic.

pub mod handlers;
pub mod match_report;
pub mod models;
pub mod offer_parser;
pub mod relevance;
