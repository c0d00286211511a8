// Model exports
pub mod domain;
pub mod embedding;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateCard, GenderPreference, Match, MatchAction, MatchStatus, MatchView, PairKey,
    Preferences, Profile, ProfileAnalysis, ANY_GENDER,
};
pub use embedding::Embedding;
pub use requests::{
    FindMatchesRequest, MatchActionRequest, ProfileSubmission, SetActiveRequest,
    SubmitProfileRequest, UserQuery,
};
pub use responses::{
    ErrorResponse, FindMatchesResponse, HealthResponse, LikeResponse, ListMatchesResponse,
    PassResponse, ProfileResponse,
};
