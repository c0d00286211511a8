use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::error::MatchError;
use crate::models::{Embedding, Profile, ProfileAnalysis, ProfileSubmission};
use crate::services::ai::ProfileAnalyzer;
use crate::services::storage::Storage;

/// Text the embedding is generated from: the biography plus its analysis
pub fn embedding_text(bio: &str, analysis: &ProfileAnalysis) -> Result<String, MatchError> {
    Ok(format!("{}\n\nAnalysis: {}", bio, serde_json::to_string(analysis)?))
}

/// Accepts profile submissions and makes them matchable
pub struct ProfileService {
    store: Arc<dyn Storage>,
    analyzer: Arc<dyn ProfileAnalyzer>,
    dimensions: usize,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Storage>, analyzer: Arc<dyn ProfileAnalyzer>, dimensions: usize) -> Self {
        Self {
            store,
            analyzer,
            dimensions,
        }
    }

    /// Validate, analyze, embed, then upsert as complete
    ///
    /// Nothing is written when validation or either AI call fails.
    pub async fn submit(
        &self,
        user_id: &str,
        submission: ProfileSubmission,
    ) -> Result<Profile, MatchError> {
        if user_id.trim().is_empty() {
            return Err(MatchError::Validation("userId must not be empty".to_string()));
        }
        submission.validate()?;

        let analysis = self.analyzer.analyze_profile(&submission.bio).await?;
        let text = embedding_text(&submission.bio, &analysis)?;
        let raw = self.analyzer.generate_embedding(&text).await?;
        if raw.len() != self.dimensions {
            tracing::debug!(
                "Fitting embedding for {} from {} to {} dimensions",
                user_id,
                raw.len(),
                self.dimensions
            );
        }
        let embedding = Embedding::fit(raw, self.dimensions);

        let photo_urls = match submission.photo_urls {
            Some(urls) => urls,
            None => self
                .store
                .get_profile(user_id)
                .await?
                .map(|p| p.photo_urls)
                .unwrap_or_default(),
        };

        let profile = Profile {
            user_id: user_id.to_string(),
            bio: submission.bio,
            age: submission.age,
            gender: submission.gender.trim().to_ascii_lowercase(),
            location: submission.location,
            latitude: submission.latitude,
            longitude: submission.longitude,
            preferences: submission.preferences,
            analysis: Some(analysis),
            embedding: Some(embedding),
            photo_urls,
            is_complete: true,
            // Only applies to a new row; stores keep an existing flag
            is_active: true,
            updated_at: Utc::now(),
        };

        let stored = self.store.upsert_profile(&profile).await?;
        tracing::info!("Profile {} submitted and analyzed", user_id);

        Ok(stored)
    }

    pub async fn get(&self, user_id: &str) -> Result<Profile, MatchError> {
        self.store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| MatchError::ProfileNotFound(user_id.to_string()))
    }

    /// Inactive profiles drop out of every candidate pool
    pub async fn set_active(&self, user_id: &str, active: bool) -> Result<Profile, MatchError> {
        let profile = self
            .store
            .set_active(user_id, active)
            .await?
            .ok_or_else(|| MatchError::ProfileNotFound(user_id.to_string()))?;
        tracing::info!("Profile {} active={}", user_id, active);
        Ok(profile)
    }
}
