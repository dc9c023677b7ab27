//! API Gateway Library
//!
//! This crate provides the HTTP REST API that translates requests to gRPC
//! calls on identity-service and cohort-service.

pub mod access;
pub mod clients;
pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use crate::clients::{CohortApi, CohortClient, IdentityApi, IdentityClient};
use crate::config::GatewayConfig;
use crate::middleware::Cache;
use crate::routes::create_router;
use crate::state::AppState;

/// Run the gateway as an embedded component (for combined binary).
pub async fn run_embedded(
    host: &str,
    port: u16,
    identity_port: u16,
    cohort_port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    // Sibling services share the process host
    let mut config = GatewayConfig::from_env();
    config.identity_service_url = format!("http://127.0.0.1:{}", identity_port);
    config.cohort_service_url = format!("http://127.0.0.1:{}", cohort_port);

    run_server_with_config(host, port, config).await
}

/// Run the gateway against the service URLs from the environment.
pub async fn run_standalone(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    run_server_with_config(host, port, GatewayConfig::from_env()).await
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(
    host: &str,
    port: u16,
    config: GatewayConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Create gRPC clients
    let identity_client: Arc<dyn IdentityApi> =
        Arc::new(IdentityClient::connect(&config.identity_service_url).await?);
    let cohort_client: Arc<dyn CohortApi> =
        Arc::new(CohortClient::connect(&config.cohort_service_url).await?);

    // Create cache
    let cache = Arc::new(Cache::connect(&config.cache).await?);

    let state = AppState::new(identity_client, cohort_client, cache, config);

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Gateway listening on {}", addr);

    // Client addresses feed the rate limiter
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
