use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::Preferences;

/// Request to find matches
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Like or pass on a match, on behalf of `user_id`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchActionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// `?userId=` query string
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Toggle whether a profile takes part in matching
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetActiveRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    pub active: bool,
}

/// Profile create-or-update payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_submission"))]
pub struct ProfileSubmission {
    #[validate(length(min = 50, max = 5000))]
    pub bio: String,
    #[validate(range(min = 18, max = 100))]
    pub age: u8,
    #[validate(length(min = 1))]
    pub gender: String,
    #[validate(length(min = 1))]
    pub location: String,
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(default)]
    pub longitude: Option<f64>,
    pub preferences: Preferences,
    #[serde(default)]
    pub photo_urls: Option<Vec<String>>,
}

/// Profile submission wrapped with the acting user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitProfileRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(nested)]
    #[serde(flatten)]
    pub profile: ProfileSubmission,
}

fn validate_submission(submission: &ProfileSubmission) -> Result<(), ValidationError> {
    if submission.latitude.is_some() != submission.longitude.is_some() {
        return Err(ValidationError::new("coordinates_incomplete"));
    }
    validate_preferences(&submission.preferences)
}

/// Bounds that must hold before a profile is written
pub fn validate_preferences(prefs: &Preferences) -> Result<(), ValidationError> {
    if prefs.age_min < 18 || prefs.age_max > 100 {
        return Err(ValidationError::new("age_bounds_out_of_range"));
    }
    if prefs.age_min > prefs.age_max {
        return Err(ValidationError::new("age_min_exceeds_age_max"));
    }
    if !prefs.max_distance.is_finite() || prefs.max_distance <= 0.0 {
        return Err(ValidationError::new("max_distance_not_positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::GenderPreference;

    fn submission() -> ProfileSubmission {
        ProfileSubmission {
            bio: "I love long walks, cooking for friends, and reading on rainy Sunday afternoons.".to_string(),
            age: 30,
            gender: "male".to_string(),
            location: "Brooklyn, NY".to_string(),
            latitude: Some(40.6782),
            longitude: Some(-73.9442),
            preferences: Preferences {
                age_min: 25,
                age_max: 40,
                max_distance: 50.0,
                gender_preference: GenderPreference::Any,
                dealbreakers: vec![],
            },
            photo_urls: None,
        }
    }

    #[test]
    fn test_valid_submission() {
        assert!(submission().validate().is_ok());
    }

    #[test]
    fn test_age_min_above_age_max_rejected() {
        let mut s = submission();
        s.preferences.age_min = 45;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_short_bio_rejected() {
        let mut s = submission();
        s.bio = "too short".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_half_coordinates_rejected() {
        let mut s = submission();
        s.longitude = None;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_non_positive_distance_rejected() {
        let mut s = submission();
        s.preferences.max_distance = 0.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_underage_rejected() {
        let mut s = submission();
        s.age = 17;
        assert!(s.validate().is_err());
    }
}
