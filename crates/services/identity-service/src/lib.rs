//! Identity Service Library
//!
//! Fronts the third-party identity provider over gRPC: verifies session
//! tokens and manages invitations and program roles through the provider's
//! management API. It can be run standalone or embedded in the combined binary.

pub mod client;
pub mod config;
pub mod grpc;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tracing::info;

use crate::client::IdpClient;
use crate::config::IdentityServiceConfig;
use crate::grpc::IdentityGrpcService;
use crate::service::{IdentityManager, TokenVerifier};

/// Run the identity service as an embedded component (for combined binary).
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = IdentityServiceConfig::from_env()?;
    run_server_with_config(host, port, config).await
}

async fn run_server_with_config(
    host: &str,
    port: u16,
    config: IdentityServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let idp = IdpClient::new(&config.idp)?;
    let verifier = TokenVerifier::new(&config.token)?;

    let identity_service = Arc::new(IdentityManager::new(Arc::new(idp), verifier));
    let grpc_service = IdentityGrpcService::new(identity_service);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Identity service listening on {}", addr);

    Server::builder()
        .add_service(proto::IdentityServiceServer::new(grpc_service))
        .serve(addr)
        .await?;

    Ok(())
}
