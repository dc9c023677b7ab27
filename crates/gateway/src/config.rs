//! Gateway configuration.

use common::{env_or, CacheConfig, RateLimitConfig};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Identity service gRPC endpoint
    pub identity_service_url: String,
    /// Cohort service gRPC endpoint
    pub cohort_service_url: String,
    /// Redis cache and TTLs
    pub cache: CacheConfig,
    /// Limit for authenticated API calls
    pub rate_limit: RateLimitConfig,
    /// Stricter limit for calls that send invitation emails
    pub invite_rate_limit: RateLimitConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            identity_service_url: env_or(&["IDENTITY_SERVICE_URL"], &defaults.identity_service_url),
            cohort_service_url: env_or(&["COHORT_SERVICE_URL"], &defaults.cohort_service_url),
            cache: CacheConfig::from_env(),
            rate_limit: RateLimitConfig::from_env("RATE_LIMIT", defaults.rate_limit),
            invite_rate_limit: RateLimitConfig::from_env(
                "RATE_LIMIT_INVITE",
                defaults.invite_rate_limit,
            ),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            identity_service_url: "http://localhost:50051".to_string(),
            cohort_service_url: "http://localhost:50052".to_string(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            invite_rate_limit: RateLimitConfig {
                max_requests: 20,
                window_seconds: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_limit_is_stricter() {
        let config = GatewayConfig::default();
        assert!(config.invite_rate_limit.max_requests < config.rate_limit.max_requests);
        assert_eq!(config.cohort_service_url, "http://localhost:50052");
    }

    #[test]
    fn test_rate_limit_from_env() {
        std::env::set_var("GATEWAY_TEST_LIMIT_REQUESTS", "7");
        let limit = RateLimitConfig::from_env("GATEWAY_TEST_LIMIT", RateLimitConfig::default());
        assert_eq!(limit.max_requests, 7);
        assert_eq!(limit.window_seconds, 60);
    }
}
