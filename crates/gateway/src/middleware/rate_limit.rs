//! Rate limiting middleware.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::warn;

use common::{AppError, RateLimitConfig};

use crate::state::AppState;

/// Rate limit middleware for general endpoints.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = state.config.rate_limit.clone();
    rate_limit_internal(state, connect_info, request, next, "api", limit).await
}

/// Rate limit middleware for endpoints that send invitation emails (stricter).
pub async fn rate_limit_invite_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = state.config.invite_rate_limit.clone();
    rate_limit_internal(state, connect_info, request, next, "invite", limit).await
}

async fn rate_limit_internal(
    state: AppState,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
    bucket: &str,
    limit: RateLimitConfig,
) -> Response {
    let RateLimitConfig {
        max_requests,
        window_seconds,
    } = limit;

    // Only mutating calls count against the invite bucket
    if bucket == "invite" && request.method() == Method::GET {
        return next.run(request).await;
    }

    let ip = get_client_ip(&request, connect_info);
    let identifier = format!("{}:{}", bucket, ip);

    // Check rate limit
    let (count, allowed) = match state
        .cache
        .check_rate_limit(&identifier, max_requests, window_seconds)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            // Fail closed
            warn!("Rate limit check failed: {}", e);
            return rate_limit_exceeded_response(max_requests, window_seconds);
        }
    };

    if !allowed {
        return rate_limit_exceeded_response(max_requests, window_seconds);
    }

    // Add rate limit headers
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-RateLimit-Limit", HeaderValue::from(max_requests));
    headers.insert(
        "X-RateLimit-Remaining",
        HeaderValue::from(max_requests.saturating_sub(count)),
    );

    response
}

fn get_client_ip(request: &Request<Body>, connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    // Try X-Forwarded-For header first
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    // Try X-Real-IP header
    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
    {
        return real_ip.to_string();
    }

    // Fall back to connection socket address
    connect_info
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn rate_limit_exceeded_response(max_requests: u64, window_seconds: u64) -> Response {
    let mut response = AppError::TooManyRequests.into_response();

    let headers = response.headers_mut();
    headers.insert("Retry-After", HeaderValue::from(window_seconds));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
    headers.insert("X-RateLimit-Limit", HeaderValue::from(max_requests));

    response
}
