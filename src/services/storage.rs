use std::collections::HashSet;

use uuid::Uuid;

use crate::core::ActionOutcome;
use crate::error::MatchError;
use crate::models::{Match, MatchAction, MatchStatus, Profile};

/// Bulk profile query predicate
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    pub require_complete: bool,
    pub require_active: bool,
    pub require_embedding: bool,
    pub exclude_user_ids: HashSet<String>,
}

impl ProfileFilter {
    /// Complete, active, embedded profiles outside `exclude_user_ids`
    pub fn matchable(exclude_user_ids: HashSet<String>) -> Self {
        Self {
            require_complete: true,
            require_active: true,
            require_embedding: true,
            exclude_user_ids,
        }
    }

    pub fn accepts(&self, profile: &Profile) -> bool {
        (!self.require_complete || profile.is_complete)
            && (!self.require_active || profile.is_active)
            && (!self.require_embedding || profile.embedding.is_some())
            && !self.exclude_user_ids.contains(&profile.user_id)
    }
}

/// Data-access contract the matching engine runs against
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    // Profiles
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, MatchError>;
    /// Insert or replace a profile and return the stored row
    ///
    /// The active flag is only written for a new row; an existing row keeps
    /// its own, which changes solely through [`Storage::set_active`].
    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, MatchError>;
    /// Flip the active flag alone; `None` when the profile does not exist
    async fn set_active(&self, user_id: &str, active: bool) -> Result<Option<Profile>, MatchError>;
    async fn query_profiles(&self, filter: &ProfileFilter) -> Result<Vec<Profile>, MatchError>;

    // Matches
    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, MatchError>;
    async fn find_match_between(&self, a: &str, b: &str) -> Result<Option<Match>, MatchError>;
    /// Every user sharing a match with `user_id`, in either direction
    async fn matched_user_ids(&self, user_id: &str) -> Result<HashSet<String>, MatchError>;
    /// Insert a new match; `DuplicatePair` when the unordered pair already has one
    async fn insert_match(&self, record: &Match) -> Result<(), MatchError>;
    /// Run [`Match::apply`] atomically against the stored row
    async fn apply_action(
        &self,
        id: Uuid,
        action: MatchAction,
        user_id: &str,
    ) -> Result<ActionOutcome, MatchError>;
    async fn list_matches(
        &self,
        user_id: &str,
        statuses: &[MatchStatus],
    ) -> Result<Vec<Match>, MatchError>;

    async fn health_check(&self) -> Result<bool, MatchError>;
}
