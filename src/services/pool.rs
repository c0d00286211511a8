use std::sync::Arc;

use crate::error::MatchError;
use crate::models::Profile;
use crate::services::storage::{ProfileFilter, Storage};

/// Supplies the profiles a requester may be ranked against
///
/// Complete, active, embedded profiles other than the requester and anyone
/// already sharing a match with them in either direction. Order is unspecified.
#[derive(Clone)]
pub struct CandidatePool {
    store: Arc<dyn Storage>,
}

impl CandidatePool {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    pub async fn fetch(&self, requester_id: &str) -> Result<Vec<Profile>, MatchError> {
        let mut excluded = self.store.matched_user_ids(requester_id).await?;
        let already_matched = excluded.len();
        excluded.insert(requester_id.to_string());

        let filter = ProfileFilter::matchable(excluded);
        let pool: Vec<Profile> = self
            .store
            .query_profiles(&filter)
            .await?
            .into_iter()
            // Stores may answer loosely; hold them to the contract
            .filter(|p| filter.accepts(p))
            .collect();

        tracing::debug!(
            "Candidate pool for {}: {} profiles ({} excluded by existing matches)",
            requester_id,
            pool.len(),
            already_matched
        );

        Ok(pool)
    }
}
