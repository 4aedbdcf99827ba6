//! iNaturalist new-species detection HTTP service
//!
//! Exposes the species query engine over HTTP for front-ends that
//! cannot shell out to the CLI.

mod error;
mod server;
mod types;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::error::{Result, ServerError};
use crate::server::{start_server, ServerState, SharedState};
use inat_diff::query::SpeciesQuery;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("inat_diff_server=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    info!("Starting inat-diff server...");

    // Load configuration from environment
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3004);

    info!("Port: {}", port);

    let state: SharedState = Arc::new(ServerState::new(SpeciesQuery::new()));

    start_server(state, port)
        .await
        .map_err(|e| ServerError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
