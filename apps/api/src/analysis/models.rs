//! Stored job analyses — one row per job offer a user is tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::match_report::MatchReport;
use crate::analysis::offer_parser::JobOfferContext;

/// Where the user stands with this job offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Saved,
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Saved => "saved",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "saved" => Some(ApplicationStatus::Saved),
            "applied" => Some(ApplicationStatus::Applied),
            "interview" => Some(ApplicationStatus::Interview),
            "offer" => Some(ApplicationStatus::Offer),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobAnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub title: String,
    pub raw_text: String,
    /// Parsed offer context, recomputed whenever raw_text changes.
    pub context: Json<JobOfferContext>,
    /// Profile match 0–100 at analysis time; null when the user had no
    /// profile yet.
    pub match_score: Option<i16>,
    /// Strengths, gaps, and missing keywords; empty when no profile existed.
    pub match_report: Json<MatchReport>,
    /// Stored as text; `ApplicationStatus` gives the closed set.
    pub application_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ApplicationStatus::Saved,
            ApplicationStatus::Applied,
            ApplicationStatus::Interview,
            ApplicationStatus::Offer,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ApplicationStatus::parse("ghosted"), None);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::Interview).unwrap();
        assert_eq!(json, r#""interview""#);
    }
}
