//! Match lifecycle: PENDING -> LIKED -> MUTUAL, or -> PASSED.
//!
//! The transition rules live on [`Match::apply`] as a pure function. Stores
//! run it under a row lock (see [`Storage::apply_action`]) so that two
//! near-simultaneous likes from both sides are both observed.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::MatchError;
use crate::models::{CandidateCard, Match, MatchAction, MatchStatus, MatchView};
use crate::services::storage::Storage;

/// Which side of a match a user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Initiator,
    Candidate,
}

/// Result of applying an action to a match
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub record: Match,
    /// True only for the action that moved the match into MUTUAL
    pub became_mutual: bool,
}

impl Match {
    pub fn side_of(&self, user_id: &str) -> Option<Side> {
        if self.initiator_id == user_id {
            Some(Side::Initiator)
        } else if self.candidate_id == user_id {
            Some(Side::Candidate)
        } else {
            None
        }
    }

    /// Apply `action` by `user_id`, returning whether it produced a mutual match
    ///
    /// - like: sets the acting side's flag; initiator moves PENDING to LIKED;
    ///   both flags set moves to MUTUAL. Rejected on MUTUAL or PASSED.
    /// - pass: PENDING/LIKED move to PASSED, PASSED is a no-op, MUTUAL is rejected.
    pub fn apply(&mut self, action: MatchAction, user_id: &str) -> Result<bool, MatchError> {
        let side = self.side_of(user_id).ok_or_else(|| MatchError::InvalidParty {
            match_id: self.id,
            user_id: user_id.to_string(),
        })?;

        match action {
            MatchAction::Like => {
                if self.status.is_terminal() {
                    return Err(MatchError::InvalidTransition {
                        action,
                        status: self.status,
                    });
                }

                match side {
                    Side::Initiator => {
                        self.initiator_liked = true;
                        self.status = MatchStatus::Liked;
                    }
                    Side::Candidate => self.candidate_liked = true,
                }

                if self.initiator_liked && self.candidate_liked {
                    self.status = MatchStatus::Mutual;
                }
                self.updated_at = Utc::now();

                Ok(self.status == MatchStatus::Mutual)
            }
            MatchAction::Pass => match self.status {
                MatchStatus::Passed => Ok(false),
                MatchStatus::Mutual => Err(MatchError::InvalidTransition {
                    action,
                    status: self.status,
                }),
                MatchStatus::Pending | MatchStatus::Liked => {
                    self.status = MatchStatus::Passed;
                    self.updated_at = Utc::now();
                    Ok(false)
                }
            },
        }
    }
}

/// Persists ranked matches and drives like/pass transitions
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn Storage>,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Insert a new PENDING match; `DuplicatePair` if the pair already has one
    pub async fn create_pending(
        &self,
        initiator_id: &str,
        candidate_id: &str,
        score: u8,
        explanation: String,
    ) -> Result<Match, MatchError> {
        if initiator_id == candidate_id {
            return Err(MatchError::Validation("a user cannot be matched with themselves".to_string()));
        }

        if self
            .store
            .find_match_between(initiator_id, candidate_id)
            .await?
            .is_some()
        {
            return Err(MatchError::DuplicatePair(
                initiator_id.to_string(),
                candidate_id.to_string(),
            ));
        }

        let record = Match::pending(initiator_id, candidate_id, score, explanation);
        self.store.insert_match(&record).await?;

        tracing::debug!(
            "Created pending match {}: {} -> {} (score {})",
            record.id,
            initiator_id,
            candidate_id,
            score
        );

        Ok(record)
    }

    /// Like a match on behalf of `user_id`
    pub async fn like(&self, match_id: Uuid, user_id: &str) -> Result<ActionOutcome, MatchError> {
        let outcome = self
            .store
            .apply_action(match_id, MatchAction::Like, user_id)
            .await?;

        if outcome.became_mutual {
            tracing::info!("Match {} is now mutual", match_id);
        }

        Ok(outcome)
    }

    /// Pass on a match on behalf of `user_id`
    pub async fn pass(&self, match_id: Uuid, user_id: &str) -> Result<Match, MatchError> {
        let outcome = self
            .store
            .apply_action(match_id, MatchAction::Pass, user_id)
            .await?;

        tracing::debug!("User {} passed on match {}", user_id, match_id);

        Ok(outcome.record)
    }

    /// Every non-passed match involving `user_id`, highest score first
    pub async fn list_active(&self, user_id: &str) -> Result<Vec<MatchView>, MatchError> {
        let mut matches = self.store.list_matches(user_id, &MatchStatus::active()).await?;
        matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.created_at.cmp(&b.created_at)));

        let mut views = Vec::with_capacity(matches.len());
        for record in matches {
            let counterpart = match record.counterpart_of(user_id) {
                Some(other) => self.store.get_profile(other).await?,
                None => None,
            };
            views.push(MatchView {
                record,
                counterpart: counterpart.as_ref().map(CandidateCard::from),
            });
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Match {
        Match::pending("alice", "bob", 80, "You both love hiking.".to_string())
    }

    #[test]
    fn test_initiator_like_moves_to_liked() {
        let mut m = pending();
        assert!(!m.apply(MatchAction::Like, "alice").unwrap());
        assert_eq!(m.status, MatchStatus::Liked);
        assert!(m.initiator_liked);
    }

    #[test]
    fn test_candidate_like_first_stays_pending() {
        let mut m = pending();
        assert!(!m.apply(MatchAction::Like, "bob").unwrap());
        assert_eq!(m.status, MatchStatus::Pending);
        assert!(m.candidate_liked);

        assert!(m.apply(MatchAction::Like, "alice").unwrap());
        assert_eq!(m.status, MatchStatus::Mutual);
    }

    #[test]
    fn test_mutual_reported_once() {
        let mut m = pending();
        m.apply(MatchAction::Like, "alice").unwrap();
        assert!(m.apply(MatchAction::Like, "bob").unwrap());

        let err = m.apply(MatchAction::Like, "bob").unwrap_err();
        assert!(matches!(
            err,
            MatchError::InvalidTransition { status: MatchStatus::Mutual, .. }
        ));
    }

    #[test]
    fn test_repeat_like_is_idempotent() {
        let mut m = pending();
        m.apply(MatchAction::Like, "alice").unwrap();
        assert!(!m.apply(MatchAction::Like, "alice").unwrap());
        assert_eq!(m.status, MatchStatus::Liked);
    }

    #[test]
    fn test_pass_after_mutual_rejected() {
        let mut m = pending();
        m.apply(MatchAction::Like, "alice").unwrap();
        m.apply(MatchAction::Like, "bob").unwrap();

        let err = m.apply(MatchAction::Pass, "bob").unwrap_err();
        assert!(matches!(err, MatchError::InvalidTransition { action: MatchAction::Pass, .. }));
        assert_eq!(m.status, MatchStatus::Mutual);
    }

    #[test]
    fn test_pass_is_idempotent() {
        let mut m = pending();
        m.apply(MatchAction::Like, "alice").unwrap();
        m.apply(MatchAction::Pass, "bob").unwrap();
        assert_eq!(m.status, MatchStatus::Passed);

        assert!(!m.apply(MatchAction::Pass, "alice").unwrap());
        assert_eq!(m.status, MatchStatus::Passed);
    }

    #[test]
    fn test_like_after_pass_rejected() {
        let mut m = pending();
        m.apply(MatchAction::Pass, "bob").unwrap();
        assert!(m.apply(MatchAction::Like, "alice").is_err());
        assert!(m.apply(MatchAction::Like, "bob").is_err());
    }

    #[test]
    fn test_stranger_is_invalid_party() {
        let mut m = pending();
        let err = m.apply(MatchAction::Like, "mallory").unwrap_err();
        assert!(matches!(err, MatchError::InvalidParty { .. }));
        let err = m.apply(MatchAction::Pass, "mallory").unwrap_err();
        assert!(matches!(err, MatchError::InvalidParty { .. }));
    }
}
