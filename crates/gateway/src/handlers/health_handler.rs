//! Health check handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub services: ServiceStatus,
}

/// Individual service status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub redis: ServiceHealth,
}

/// Service health with optional error message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    fn from_check<T, E: std::fmt::Display>(check: Result<T, E>) -> Self {
        match check {
            Ok(_) => Self {
                status: "healthy".to_string(),
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Report Redis connectivity
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies reachable", body = HealthResponse),
        (status = 503, description = "Redis unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let redis = ServiceHealth::from_check(state.cache.get::<String>("health_check").await);
    let healthy = redis.is_healthy();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        services: ServiceStatus { redis },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_maps_to_health() {
        let ok = ServiceHealth::from_check::<_, String>(Ok(()));
        assert!(ok.is_healthy());
        assert_eq!(ok.status, "healthy");

        let down = ServiceHealth::from_check::<(), _>(Err("connection refused"));
        assert!(!down.is_healthy());
        assert_eq!(down.error.as_deref(), Some("connection refused"));
    }
}
