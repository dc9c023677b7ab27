//! Cohort Service Library
//!
//! Owns classes, rosters, surveys and engagement data, exposed over gRPC.
//! It can be run as a standalone service or embedded in the combined binary.

pub mod config;
pub mod grpc;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tracing::info;

use crate::config::CohortServiceConfig;
use crate::grpc::{ClassGrpcService, EngagementGrpcService, RosterGrpcService, SurveyGrpcService};
use crate::infra::Database;
use crate::repository::{ClassStore, EngagementStore, RosterStore, SurveyStore};
use crate::service::{ClassManager, EngagementManager, RosterManager, SurveyManager};

/// Run the cohort service as an embedded component (for combined binary).
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = CohortServiceConfig::from_env();
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = CohortServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

async fn run_server_with_config(
    host: &str,
    port: u16,
    config: CohortServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;
    let db_conn = db.get_connection();

    let classes = Arc::new(ClassStore::new(db_conn.clone()));
    let roster = Arc::new(RosterStore::new(db_conn.clone()));
    let surveys = Arc::new(SurveyStore::new(db_conn.clone()));
    let engagement = Arc::new(EngagementStore::new(db_conn));

    let class_service = Arc::new(ClassManager::new(classes.clone(), roster.clone()));
    let roster_service = Arc::new(RosterManager::new(classes.clone(), roster.clone()));
    let survey_service = Arc::new(SurveyManager::new(
        classes.clone(),
        roster.clone(),
        surveys.clone(),
    ));
    let engagement_service = Arc::new(EngagementManager::new(
        classes, roster, surveys, engagement,
    ));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Cohort service listening on {}", addr);

    Server::builder()
        .add_service(proto::ClassServiceServer::new(ClassGrpcService::new(
            class_service,
        )))
        .add_service(proto::RosterServiceServer::new(RosterGrpcService::new(
            roster_service,
        )))
        .add_service(proto::SurveyServiceServer::new(SurveyGrpcService::new(
            survey_service,
        )))
        .add_service(proto::EngagementServiceServer::new(
            EngagementGrpcService::new(engagement_service),
        ))
        .serve(addr)
        .await?;

    Ok(())
}
