//! API Gateway - HTTP REST API for the cohort program services.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gateway")]
#[command(about = "REST gateway for cohort programs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long, env = "GATEWAY_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "GATEWAY_PORT", default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            // Services are reached at IDENTITY_SERVICE_URL and COHORT_SERVICE_URL
            gateway_lib::run_standalone(&host, port).await?;
        }
    }

    Ok(())
}
