use anyhow::{Context, Result};

use crate::rag::dedup::DEFAULT_SIMILARITY_THRESHOLD;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub gemini_api_key: String,
    /// Jaccard similarity above which two RAG entries are considered
    /// duplicates. Tunable per deployment; defaults to 0.78.
    pub dedup_similarity_threshold: f64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            dedup_similarity_threshold: match std::env::var("DEDUP_SIMILARITY_THRESHOLD") {
                Ok(raw) => raw
                    .parse::<f64>()
                    .context("DEDUP_SIMILARITY_THRESHOLD must be a number in (0, 1]")?,
                Err(_) => DEFAULT_SIMILARITY_THRESHOLD,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
