//! Kindred Match - semantic matching engine for the Kindred dating platform
//!
//! Ranks candidates by embedding similarity behind a mutual
//! age/gender/distance filter, persists the shortlist as pending matches and
//! drives each match through like/pass to a mutual connection.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{cosine_similarity, distance_km, haversine_distance, to_score, Matcher};
pub use error::MatchError;
pub use models::{FindMatchesRequest, FindMatchesResponse, Match, MatchStatus, Profile};
