use serde::{Deserialize, Serialize};

use crate::models::domain::{CandidateCard, Match, MatchView, Profile};

/// Response for find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub matches: Vec<MatchView>,
    pub total_results: usize,
}

/// Response for the active matches listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMatchesResponse {
    pub matches: Vec<MatchView>,
}

/// Response for a like action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub mutual: bool,
    #[serde(rename = "match")]
    pub record: Match,
}

/// Response for a pass action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassResponse {
    pub success: bool,
    #[serde(rename = "match")]
    pub record: Match,
}

/// Profile as returned to its owner (embedding omitted)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub card: CandidateCard,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub preferences: crate::models::Preferences,
    pub is_complete: bool,
    pub is_active: bool,
    pub has_embedding: bool,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            card: CandidateCard::from(profile),
            latitude: profile.latitude,
            longitude: profile.longitude,
            preferences: profile.preferences.clone(),
            is_complete: profile.is_complete,
            is_active: profile.is_active,
            has_embedding: profile.embedding.is_some(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
