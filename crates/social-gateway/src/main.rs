//! Social Gateway Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p social-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use social_common::{try_init_tracing, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Social Gateway Server...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        port = config.gateway.server.port,
        "Configuration loaded"
    );

    social_gateway::run(config).await?;

    Ok(())
}
