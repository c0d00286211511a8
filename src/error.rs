use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ErrorResponse, MatchAction, MatchStatus};

/// Errors produced by the matching engine and its collaborators
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("profile not found for user {0}")]
    ProfileNotFound(String),

    #[error("profile for user {0} is not complete")]
    ProfileIncomplete(String),

    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("match not found: {0}")]
    MatchNotFound(Uuid),

    #[error("user {user_id} is not a party to match {match_id}")]
    InvalidParty { match_id: Uuid, user_id: String },

    #[error("cannot {action} a match in status {status}")]
    InvalidTransition {
        action: MatchAction,
        status: MatchStatus,
    },

    #[error("a match already exists between {0} and {1}")]
    DuplicatePair(String, String),

    #[error("external service failure: {0}")]
    ExternalService(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MatchError {
    /// Stable machine-readable code surfaced to callers
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Validation(_) => "validation_error",
            MatchError::ProfileNotFound(_) => "profile_not_found",
            MatchError::ProfileIncomplete(_) => "profile_incomplete",
            MatchError::DimensionMismatch { .. } => "dimension_mismatch",
            MatchError::MatchNotFound(_) => "match_not_found",
            MatchError::InvalidParty { .. } => "invalid_party",
            MatchError::InvalidTransition { .. } => "invalid_transition",
            MatchError::DuplicatePair(..) => "duplicate_pair",
            MatchError::ExternalService(_) => "external_service_failure",
            MatchError::Storage(_) => "storage_error",
            MatchError::Internal(_) => "internal_error",
        }
    }

    /// Internal invariant violations are never shown to users in detail
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            MatchError::DimensionMismatch { .. } | MatchError::Storage(_) | MatchError::Internal(_)
        )
    }

    /// Code and message safe to return to a caller
    pub fn public_parts(&self) -> (&'static str, String) {
        if self.is_internal() {
            ("internal_error", "An internal error occurred".to_string())
        } else {
            (self.code(), self.to_string())
        }
    }
}

impl From<sqlx::Error> for MatchError {
    fn from(e: sqlx::Error) -> Self {
        MatchError::Storage(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for MatchError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        MatchError::Storage(format!("migration failed: {}", e))
    }
}

impl From<serde_json::Error> for MatchError {
    fn from(e: serde_json::Error) -> Self {
        MatchError::Internal(e.to_string())
    }
}

impl From<validator::ValidationErrors> for MatchError {
    fn from(e: validator::ValidationErrors) -> Self {
        MatchError::Validation(e.to_string())
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Validation(_) => StatusCode::BAD_REQUEST,
            MatchError::ProfileIncomplete(_) => StatusCode::BAD_REQUEST,
            MatchError::ProfileNotFound(_) | MatchError::MatchNotFound(_) => StatusCode::NOT_FOUND,
            MatchError::InvalidParty { .. } => StatusCode::FORBIDDEN,
            MatchError::InvalidTransition { .. } | MatchError::DuplicatePair(..) => {
                StatusCode::CONFLICT
            }
            MatchError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            MatchError::DimensionMismatch { .. }
            | MatchError::Storage(_)
            | MatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            tracing::error!("Internal failure: {}", self);
        }

        let (code, message) = self.public_parts();
        let status = self.status_code();

        HttpResponse::build(status).json(ErrorResponse {
            error: code.to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
