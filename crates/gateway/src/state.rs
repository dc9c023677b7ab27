//! Application state for dependency injection.

use std::sync::Arc;

use crate::clients::{CohortApi, IdentityApi};
use crate::config::GatewayConfig;
use crate::middleware::Cache;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity_client: Arc<dyn IdentityApi>,
    pub cohort_client: Arc<dyn CohortApi>,
    pub cache: Arc<Cache>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        identity_client: Arc<dyn IdentityApi>,
        cohort_client: Arc<dyn CohortApi>,
        cache: Arc<Cache>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            identity_client,
            cohort_client,
            cache,
            config,
        }
    }
}
