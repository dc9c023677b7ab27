//! Combined binary for development - runs all services in one process.

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cohort")]
#[command(about = "Cohort program services in one process for development")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all services in a single process (development mode)
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value = "3000")]
        gateway_port: u16,
        #[arg(long, default_value = "50051")]
        identity_port: u16,
        #[arg(long, default_value = "50052")]
        cohort_port: u16,
    },
    /// Run cohort-service database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

impl From<MigrateAction> for cohort_service_lib::MigrateAction {
    fn from(action: MigrateAction) -> Self {
        match action {
            MigrateAction::Up => cohort_service_lib::MigrateAction::Up,
            MigrateAction::Down => cohort_service_lib::MigrateAction::Down,
            MigrateAction::Status => cohort_service_lib::MigrateAction::Status,
            MigrateAction::Fresh => cohort_service_lib::MigrateAction::Fresh,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            gateway_port,
            identity_port,
            cohort_port,
        } => {
            info!("Starting combined services in development mode");
            info!("  Gateway:          http://{}:{}", host, gateway_port);
            info!("  Identity service: http://{}:{}", host, identity_port);
            info!("  Cohort service:   http://{}:{}", host, cohort_port);

            // cohort-service owns the database
            let cohort_host = host.clone();
            let cohort_handle = tokio::spawn(async move {
                if let Err(e) = cohort_service_lib::run_embedded(&cohort_host, cohort_port).await {
                    error!("Cohort service failed: {}", e);
                }
            });

            let identity_host = host.clone();
            let identity_handle = tokio::spawn(async move {
                if let Err(e) = identity_service_lib::run_embedded(&identity_host, identity_port).await
                {
                    error!("Identity service failed: {}", e);
                }
            });

            // Give both gRPC servers a moment to bind before the gateway dials them
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;

            let gateway_host = host.clone();
            let gateway_handle = tokio::spawn(async move {
                if let Err(e) = gateway_lib::run_embedded(
                    &gateway_host,
                    gateway_port,
                    identity_port,
                    cohort_port,
                )
                .await
                {
                    error!("Gateway failed: {}", e);
                }
            });

            // Wait for any service to exit (which would indicate an error)
            tokio::select! {
                _ = cohort_handle => {
                    error!("Cohort service exited unexpectedly");
                }
                _ = identity_handle => {
                    error!("Identity service exited unexpectedly");
                }
                _ = gateway_handle => {
                    error!("Gateway exited unexpectedly");
                }
            }
        }
        Commands::Migrate { action } => {
            cohort_service_lib::run_migrations(action.into()).await?;
        }
    }

    Ok(())
}
