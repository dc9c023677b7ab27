//! Middleware for authentication, rate limiting, and caching.

mod auth;
mod cache;
mod rate_limit;

pub use auth::{auth_middleware, require_admin, require_staff, CurrentUser};
pub use cache::{
    feedback_summary_key, gap_analysis_key, survey_summary_key, Cache, CacheStore, RedisStore,
};
#[cfg(test)]
pub use cache::MockCacheStore;
pub use rate_limit::{rate_limit_invite_middleware, rate_limit_middleware};
