use std::sync::Arc;

use futures::stream::{self, StreamExt};
use uuid::Uuid;

use crate::config::MatchingSettings;
use crate::core::{ActionOutcome, LifecycleManager, Matcher, MatcherConfig};
use crate::error::MatchError;
use crate::models::{CandidateCard, FindMatchesResponse, Match, MatchView, ProfileAnalysis};
use crate::services::ai::{fallback_explanation, ExplanationGenerator};
use crate::services::pool::CandidatePool;
use crate::services::storage::Storage;

/// Knobs for the find-matches pipeline
#[derive(Debug, Clone)]
pub struct MatchServiceConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    pub dimensions: usize,
    /// Explanation requests in flight at once
    pub explanation_concurrency: usize,
    /// Template with a `{score}` placeholder
    pub fallback_explanation: String,
}

impl Default for MatchServiceConfig {
    fn default() -> Self {
        MatchingSettings::default().into()
    }
}

impl From<MatchingSettings> for MatchServiceConfig {
    fn from(settings: MatchingSettings) -> Self {
        Self {
            default_limit: settings.default_limit,
            max_limit: settings.max_limit,
            dimensions: settings.embedding_dimensions,
            explanation_concurrency: settings.explanation_concurrency,
            fallback_explanation: settings.fallback_explanation,
        }
    }
}

/// Explanation text for one candidate, or the fallback when the AI fails
async fn explain(
    explainer: &dyn ExplanationGenerator,
    requester: &ProfileAnalysis,
    candidate_id: &str,
    candidate: &ProfileAnalysis,
    score: u8,
    fallback: &str,
) -> String {
    match explainer.generate_explanation(requester, candidate, score).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!("Empty explanation for candidate {}, using fallback", candidate_id);
            fallback_explanation(fallback, score)
        }
        Err(e) => {
            tracing::warn!(
                "Explanation failed for candidate {}, using fallback: {}",
                candidate_id,
                e
            );
            fallback_explanation(fallback, score)
        }
    }
}

/// Runs the find-matches pipeline and the like/pass lifecycle
///
/// # Pipeline Stages
/// 1. Load the requester and check it has an embedding
/// 2. Fetch the candidate pool
/// 3. Rank on the blocking pool (rayon inside)
/// 4. Generate explanations with bounded concurrency
/// 5. Persist PENDING matches sequentially
pub struct MatchService {
    store: Arc<dyn Storage>,
    pool: CandidatePool,
    matcher: Matcher,
    explainer: Arc<dyn ExplanationGenerator>,
    lifecycle: LifecycleManager,
    config: MatchServiceConfig,
}

impl MatchService {
    pub fn new(
        store: Arc<dyn Storage>,
        explainer: Arc<dyn ExplanationGenerator>,
        config: MatchServiceConfig,
    ) -> Self {
        let matcher = Matcher::new(MatcherConfig {
            default_limit: config.default_limit,
            dimensions: config.dimensions,
        });

        Self {
            pool: CandidatePool::new(store.clone()),
            lifecycle: LifecycleManager::new(store.clone()),
            store,
            matcher,
            explainer,
            config,
        }
    }

    /// Clamp a requested result count into `1..=max_limit`
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit.max(1))
    }

    /// Rank, explain and persist new matches for `user_id`
    pub async fn find_matches(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<FindMatchesResponse, MatchError> {
        let start = std::time::Instant::now();

        let requester = self
            .store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| MatchError::ProfileNotFound(user_id.to_string()))?;
        if requester.embedding.is_none() {
            return Err(MatchError::ProfileIncomplete(user_id.to_string()));
        }

        let limit = self.effective_limit(limit);
        let candidates = self.pool.fetch(user_id).await?;
        let pool_size = candidates.len();

        let matcher = self.matcher.clone();
        let ranking_requester = requester.clone();
        let result = tokio::task::spawn_blocking(move || {
            matcher.rank(&ranking_requester, candidates, Some(limit))
        })
        .await
        .map_err(|e| MatchError::Internal(format!("ranking task failed: {}", e)))??;

        // Each future owns its inputs so the whole pipeline stays Send + 'static
        let requester_analysis = Arc::new(requester.analysis.clone().unwrap_or_default());
        let fallback: Arc<str> = Arc::from(self.config.fallback_explanation.as_str());
        let pending: Vec<_> = result
            .ranked
            .iter()
            .map(|candidate| {
                let explainer = self.explainer.clone();
                let requester = requester_analysis.clone();
                let fallback = fallback.clone();
                let candidate_id = candidate.profile.user_id.clone();
                let candidate_analysis = candidate.profile.analysis.clone().unwrap_or_default();
                let score = candidate.score;
                async move {
                    explain(
                        explainer.as_ref(),
                        &requester,
                        &candidate_id,
                        &candidate_analysis,
                        score,
                        &fallback,
                    )
                    .await
                }
            })
            .collect();
        let explanations: Vec<String> = stream::iter(pending)
            .buffered(self.config.explanation_concurrency.max(1))
            .collect()
            .await;

        let eligible = result.eligible_candidates;
        let mut matches = Vec::with_capacity(result.ranked.len());
        for (candidate, explanation) in result.ranked.into_iter().zip(explanations) {
            let created = self
                .lifecycle
                .create_pending(user_id, &candidate.profile.user_id, candidate.score, explanation)
                .await;

            match created {
                Ok(record) => matches.push(MatchView {
                    record,
                    counterpart: Some(CandidateCard::from(&candidate.profile)),
                }),
                Err(MatchError::DuplicatePair(a, b)) => {
                    tracing::warn!("Skipping {} -> {}: pair already matched", a, b);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Found {} matches for {} in {}ms (pool={}, eligible={})",
            matches.len(),
            user_id,
            start.elapsed().as_millis(),
            pool_size,
            eligible
        );

        Ok(FindMatchesResponse {
            total_results: matches.len(),
            matches,
        })
    }

    pub async fn like(&self, match_id: Uuid, user_id: &str) -> Result<ActionOutcome, MatchError> {
        self.lifecycle.like(match_id, user_id).await
    }

    pub async fn pass(&self, match_id: Uuid, user_id: &str) -> Result<Match, MatchError> {
        self.lifecycle.pass(match_id, user_id).await
    }

    pub async fn list_active(&self, user_id: &str) -> Result<Vec<MatchView>, MatchError> {
        self.lifecycle.list_active(user_id).await
    }
}
