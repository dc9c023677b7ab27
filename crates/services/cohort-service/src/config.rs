//! Cohort service configuration.

use common::DatabaseConfig;

/// Cohort service configuration.
#[derive(Debug, Clone, Default)]
pub struct CohortServiceConfig {
    /// Database connection settings
    pub database: DatabaseConfig,
}

impl CohortServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig::from_env(),
        }
    }
}
