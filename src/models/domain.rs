use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::embedding::Embedding;

/// Sentinel accepted in a gender preference list
pub const ANY_GENDER: &str = "any";

/// Which genders a user wants to be matched with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub enum GenderPreference {
    Any,
    Only(BTreeSet<String>),
}

impl GenderPreference {
    /// Whether a person of `gender` satisfies this preference
    pub fn accepts(&self, gender: &str) -> bool {
        match self {
            GenderPreference::Any => true,
            GenderPreference::Only(genders) => {
                genders.contains(&gender.trim().to_ascii_lowercase())
            }
        }
    }
}

impl TryFrom<Vec<String>> for GenderPreference {
    type Error = String;

    fn try_from(values: Vec<String>) -> Result<Self, Self::Error> {
        let genders: BTreeSet<String> = values
            .iter()
            .map(|g| g.trim().to_ascii_lowercase())
            .filter(|g| !g.is_empty())
            .collect();

        if genders.is_empty() {
            return Err("genderPreference must not be empty".to_string());
        }
        if genders.contains(ANY_GENDER) {
            return Ok(GenderPreference::Any);
        }
        Ok(GenderPreference::Only(genders))
    }
}

impl From<GenderPreference> for Vec<String> {
    fn from(value: GenderPreference) -> Self {
        match value {
            GenderPreference::Any => vec![ANY_GENDER.to_string()],
            GenderPreference::Only(genders) => genders.into_iter().collect(),
        }
    }
}

/// Hard matching constraints a user sets for their counterparts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub age_min: u8,
    pub age_max: u8,
    /// Kilometres
    pub max_distance: f64,
    pub gender_preference: GenderPreference,
    /// Descriptive only, handed to the AI and never enforced
    #[serde(default)]
    pub dealbreakers: Vec<String>,
}

impl Preferences {
    pub fn accepts_age(&self, age: u8) -> bool {
        age >= self.age_min && age <= self.age_max
    }
}

/// AI-derived compatibility signals extracted from a biography
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAnalysis {
    pub values: Vec<String>,
    pub personality_traits: Vec<String>,
    pub communication_style: String,
    pub relationship_goals: Vec<String>,
    pub interests: Vec<String>,
    #[serde(default)]
    pub dealbreakers: Vec<String>,
    pub emotional_tone: String,
    /// 0 (generic) to 10 (thoughtful and genuine)
    pub authenticity: f32,
    #[serde(default)]
    pub insights: Vec<String>,
}

/// A user's dating profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub bio: String,
    pub age: u8,
    pub gender: String,
    /// Free-text label such as "Brooklyn, NY"
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub preferences: Preferences,
    #[serde(default)]
    pub analysis: Option<ProfileAnalysis>,
    #[serde(default)]
    pub embedding: Option<Embedding>,
    #[serde(rename = "photoUrls", default)]
    pub photo_urls: Vec<String>,
    #[serde(rename = "isComplete")]
    pub is_complete: bool,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Profile {
    /// Both coordinates, if the profile carries them
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Lifecycle state of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "match_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Pending,
    Liked,
    Mutual,
    Passed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "PENDING",
            MatchStatus::Liked => "LIKED",
            MatchStatus::Mutual => "MUTUAL",
            MatchStatus::Passed => "PASSED",
        }
    }

    /// MUTUAL and PASSED admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Mutual | MatchStatus::Passed)
    }

    /// Every status shown in a user's active list
    pub fn active() -> [MatchStatus; 3] {
        [MatchStatus::Pending, MatchStatus::Liked, MatchStatus::Mutual]
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User action on a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchAction {
    Like,
    Pass,
}

impl fmt::Display for MatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchAction::Like => f.write_str("like"),
            MatchAction::Pass => f.write_str("pass"),
        }
    }
}

/// Directional match record from an initiator to a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub initiator_id: String,
    pub candidate_id: String,
    /// 0 to 100
    pub score: u8,
    pub explanation: String,
    pub initiator_liked: bool,
    pub candidate_liked: bool,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// A freshly ranked match in PENDING
    pub fn pending(initiator_id: &str, candidate_id: &str, score: u8, explanation: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            initiator_id: initiator_id.to_string(),
            candidate_id: candidate_id.to_string(),
            score,
            explanation,
            initiator_liked: false,
            candidate_liked: false,
            status: MatchStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.initiator_id, &self.candidate_id)
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.initiator_id == user_id || self.candidate_id == user_id
    }

    /// The other party, from `user_id`'s point of view
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if self.initiator_id == user_id {
            Some(&self.candidate_id)
        } else if self.candidate_id == user_id {
            Some(&self.initiator_id)
        } else {
            None
        }
    }
}

/// Unordered user pair in canonical (min, max) order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub low: String,
    pub high: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self { low: a.to_string(), high: b.to_string() }
        } else {
            Self { low: b.to_string(), high: a.to_string() }
        }
    }
}

/// Display card for the other side of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCard {
    pub user_id: String,
    pub bio: String,
    pub age: u8,
    pub gender: String,
    pub location: String,
    pub photo_urls: Vec<String>,
    pub analysis: Option<ProfileAnalysis>,
}

impl From<&Profile> for CandidateCard {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            bio: profile.bio.clone(),
            age: profile.age,
            gender: profile.gender.clone(),
            location: profile.location.clone(),
            photo_urls: profile.photo_urls.clone(),
            analysis: profile.analysis.clone(),
        }
    }
}

/// Match record with its counterpart denormalized for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchView {
    #[serde(rename = "match")]
    pub record: Match,
    pub counterpart: Option<CandidateCard>,
}
