// Service exports
pub mod ai;
pub mod cache;
pub mod matching;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod profiles;
pub mod storage;

pub use ai::{
    fallback_explanation, AiClientConfig, AiError, AnthropicClient, ExplanationGenerator,
    ProfileAnalyzer,
};
pub use cache::{CacheError, CacheKey, CacheManager, CachedStorage};
pub use matching::{MatchService, MatchServiceConfig};
pub use memory::InMemoryStore;
pub use pool::CandidatePool;
pub use postgres::PostgresStore;
pub use profiles::{embedding_text, ProfileService};
pub use storage::{ProfileFilter, Storage};
