//! In-process implementation of [`Storage`].
//!
//! Used when no database URL is configured, and by the test suite.
//!
//! - `DashMap` shards give per-row exclusive access, so `apply_action` is an
//!   atomic read-modify-write.
//! - Pair uniqueness goes through an entry on the canonical [`PairKey`].

use std::collections::HashSet;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::core::ActionOutcome;
use crate::error::MatchError;
use crate::models::{Match, MatchAction, MatchStatus, PairKey, Profile};
use crate::services::storage::{ProfileFilter, Storage};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    profiles: DashMap<String, Profile>,
    matches: DashMap<Uuid, Match>,
    pairs: DashMap<PairKey, Uuid>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

#[async_trait::async_trait]
impl Storage for InMemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, MatchError> {
        Ok(self.profiles.get(user_id).map(|p| p.clone()))
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, MatchError> {
        match self.profiles.entry(profile.user_id.clone()) {
            Entry::Occupied(mut slot) => {
                let is_active = slot.get().is_active;
                let stored = slot.get_mut();
                *stored = profile.clone();
                stored.is_active = is_active;
                Ok(stored.clone())
            }
            Entry::Vacant(slot) => Ok(slot.insert(profile.clone()).clone()),
        }
    }

    async fn set_active(&self, user_id: &str, active: bool) -> Result<Option<Profile>, MatchError> {
        Ok(self.profiles.get_mut(user_id).map(|mut entry| {
            if entry.is_active != active {
                entry.is_active = active;
                entry.updated_at = Utc::now();
            }
            entry.clone()
        }))
    }

    async fn query_profiles(&self, filter: &ProfileFilter) -> Result<Vec<Profile>, MatchError> {
        Ok(self
            .profiles
            .iter()
            .filter(|entry| filter.accepts(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, MatchError> {
        Ok(self.matches.get(&id).map(|m| m.clone()))
    }

    async fn find_match_between(&self, a: &str, b: &str) -> Result<Option<Match>, MatchError> {
        let id = match self.pairs.get(&PairKey::new(a, b)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.matches.get(&id).map(|m| m.clone()))
    }

    async fn matched_user_ids(&self, user_id: &str) -> Result<HashSet<String>, MatchError> {
        Ok(self
            .pairs
            .iter()
            .filter_map(|entry| {
                let key = entry.key();
                if key.low == user_id {
                    Some(key.high.clone())
                } else if key.high == user_id {
                    Some(key.low.clone())
                } else {
                    None
                }
            })
            .collect())
    }

    async fn insert_match(&self, record: &Match) -> Result<(), MatchError> {
        match self.pairs.entry(record.pair_key()) {
            Entry::Occupied(_) => Err(MatchError::DuplicatePair(
                record.initiator_id.clone(),
                record.candidate_id.clone(),
            )),
            Entry::Vacant(slot) => {
                self.matches.insert(record.id, record.clone());
                slot.insert(record.id);
                Ok(())
            }
        }
    }

    async fn apply_action(
        &self,
        id: Uuid,
        action: MatchAction,
        user_id: &str,
    ) -> Result<ActionOutcome, MatchError> {
        let mut entry = self.matches.get_mut(&id).ok_or(MatchError::MatchNotFound(id))?;

        // Work on a copy so a rejected transition leaves the row untouched
        let mut record = entry.clone();
        let became_mutual = record.apply(action, user_id)?;
        *entry = record.clone();

        Ok(ActionOutcome {
            record,
            became_mutual,
        })
    }

    async fn list_matches(
        &self,
        user_id: &str,
        statuses: &[MatchStatus],
    ) -> Result<Vec<Match>, MatchError> {
        Ok(self
            .matches
            .iter()
            .filter(|entry| entry.involves(user_id) && statuses.contains(&entry.status))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn health_check(&self) -> Result<bool, MatchError> {
        Ok(true)
    }
}
