// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod lifecycle;
pub mod matcher;
pub mod similarity;

pub use distance::{distance_km, haversine_distance};
pub use filters::{check_eligibility, is_eligible, Rejection};
pub use lifecycle::{ActionOutcome, LifecycleManager, Side};
pub use matcher::{MatchResult, Matcher, MatcherConfig, RankedCandidate};
pub use similarity::{cosine_similarity, to_score};
