use std::cmp::Ordering;

use rayon::prelude::*;

use crate::core::{
    filters::check_eligibility,
    similarity::{cosine_similarity, to_score},
};
use crate::error::MatchError;
use crate::models::Profile;

/// Ranking parameters injected from configuration
#[derive(Debug, Clone, Copy)]
pub struct MatcherConfig {
    /// Shortlist size when the caller does not ask for one
    pub default_limit: usize,
    /// Fixed embedding dimensionality every profile is expected to carry
    pub dimensions: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            dimensions: 1536,
        }
    }
}

/// A candidate that survived eligibility, with its similarity
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub profile: Profile,
    pub similarity: f64,
    pub score: u8,
}

/// Result of the ranking step
#[derive(Debug)]
pub struct MatchResult {
    pub ranked: Vec<RankedCandidate>,
    pub total_candidates: usize,
    pub eligible_candidates: usize,
}

/// Ranks a candidate pool for one requester
///
/// # Pipeline Stages
/// 1. Mutual eligibility (age, gender, distance)
/// 2. Embedding similarity and score
/// 3. Sort by score descending, then candidate id ascending
/// 4. Truncate to the limit
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Rank `candidates` for `requester`
    ///
    /// Fails with `ProfileIncomplete` when the requester has no embedding, and
    /// with `DimensionMismatch` if the requester's or any candidate's embedding
    /// differs from the configured length; the latter fails the whole batch.
    pub fn rank(
        &self,
        requester: &Profile,
        candidates: Vec<Profile>,
        limit: Option<usize>,
    ) -> Result<MatchResult, MatchError> {
        let requester_embedding = requester
            .embedding
            .as_ref()
            .ok_or_else(|| MatchError::ProfileIncomplete(requester.user_id.clone()))?;
        if requester_embedding.len() != self.config.dimensions {
            tracing::error!(
                "Requester {} embedding has {} dimensions, expected {}",
                requester.user_id,
                requester_embedding.len(),
                self.config.dimensions
            );
            return Err(MatchError::DimensionMismatch {
                left: requester_embedding.len(),
                right: self.config.dimensions,
            });
        }

        let limit = limit.unwrap_or(self.config.default_limit);
        let total_candidates = candidates.len();

        let scored: Vec<RankedCandidate> = candidates
            .into_par_iter()
            .filter(|candidate| match check_eligibility(requester, candidate) {
                Ok(()) => true,
                Err(reason) => {
                    tracing::trace!(
                        "Candidate {} rejected for {}: {}",
                        candidate.user_id,
                        requester.user_id,
                        reason
                    );
                    false
                }
            })
            .filter_map(|candidate| {
                let embedding = candidate.embedding.as_ref()?;
                let result = cosine_similarity(requester_embedding.values(), embedding.values())
                    .map(|similarity| (similarity, to_score(similarity)));
                Some(result.map(|(similarity, score)| RankedCandidate {
                    profile: candidate,
                    similarity,
                    score,
                }))
            })
            .collect::<Result<Vec<_>, MatchError>>()
            .map_err(|e| {
                tracing::error!("Scoring failed for {}: {}", requester.user_id, e);
                e
            })?;

        let eligible_candidates = scored.len();
        let mut ranked = scored;
        ranked.par_sort_unstable_by(compare_ranked);
        ranked.truncate(limit);

        Ok(MatchResult {
            ranked,
            total_candidates,
            eligible_candidates,
        })
    }
}

/// Score descending, then candidate id ascending
fn compare_ranked(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.profile.user_id.cmp(&b.profile.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Embedding, GenderPreference, Preferences};
    use chrono::Utc;

    fn create_candidate(id: &str, age: u8, gender: &str, embedding: Vec<f32>) -> Profile {
        Profile {
            user_id: id.to_string(),
            bio: format!("Bio of {}", id),
            age,
            gender: gender.to_string(),
            location: "New York".to_string(),
            latitude: None,
            longitude: None,
            preferences: Preferences {
                age_min: 20,
                age_max: 40,
                max_distance: 50.0,
                gender_preference: GenderPreference::Any,
                dealbreakers: vec![],
            },
            analysis: None,
            embedding: Some(Embedding::new(embedding)),
            photo_urls: vec![],
            is_complete: true,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    fn create_requester() -> Profile {
        let mut requester = create_candidate("me", 30, "male", vec![1.0, 0.0, 0.0]);
        requester.preferences.gender_preference =
            GenderPreference::try_from(vec!["female".to_string()]).unwrap();
        requester
    }

    fn matcher() -> Matcher {
        Matcher::new(MatcherConfig {
            default_limit: 10,
            dimensions: 3,
        })
    }

    #[test]
    fn test_rank_filters_and_scores() {
        let candidates = vec![
            create_candidate("1", 28, "female", vec![0.0, 1.0, 0.0]), // score 50
            create_candidate("2", 45, "female", vec![1.0, 0.0, 0.0]), // too old
            create_candidate("3", 28, "male", vec![1.0, 0.0, 0.0]),   // wrong gender
        ];

        let result = matcher().rank(&create_requester(), candidates, None).unwrap();

        assert_eq!(result.total_candidates, 3);
        assert_eq!(result.eligible_candidates, 1);
        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.ranked[0].profile.user_id, "1");
        assert_eq!(result.ranked[0].score, 50);
    }

    #[test]
    fn test_rank_orders_by_score_then_id() {
        let candidates = vec![
            create_candidate("b", 28, "female", vec![0.0, 1.0, 0.0]),
            create_candidate("c", 28, "female", vec![1.0, 0.0, 0.0]),
            create_candidate("a", 28, "female", vec![0.0, 1.0, 0.0]),
        ];

        let result = matcher().rank(&create_requester(), candidates, None).unwrap();
        let ids: Vec<_> = result.ranked.iter().map(|r| r.profile.user_id.as_str()).collect();

        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_respects_limit() {
        let candidates: Vec<Profile> = (0..20)
            .map(|i| create_candidate(&format!("{:02}", i), 28, "female", vec![1.0, i as f32, 0.0]))
            .collect();

        let result = matcher().rank(&create_requester(), candidates, Some(5)).unwrap();

        assert_eq!(result.ranked.len(), 5);
        assert_eq!(result.eligible_candidates, 20);
    }

    #[test]
    fn test_requester_without_embedding() {
        let mut requester = create_requester();
        requester.embedding = None;

        let err = matcher().rank(&requester, vec![], None).unwrap_err();
        assert!(matches!(err, MatchError::ProfileIncomplete(id) if id == "me"));
    }

    #[test]
    fn test_dimension_mismatch_fails_batch() {
        let candidates = vec![
            create_candidate("1", 28, "female", vec![0.0, 1.0, 0.0]),
            create_candidate("2", 28, "female", vec![0.0, 1.0]),
        ];

        let err = matcher().rank(&create_requester(), candidates, None).unwrap_err();
        assert!(matches!(err, MatchError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_requester_dimensions_checked_against_config() {
        let mut requester = create_requester();
        requester.embedding = Some(Embedding::new(vec![1.0, 0.0]));
        let candidates = vec![create_candidate("1", 28, "female", vec![0.0, 1.0])];

        let err = matcher().rank(&requester, candidates, None).unwrap_err();
        assert!(matches!(err, MatchError::DimensionMismatch { left: 2, right: 3 }));
    }
}
