//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development when you only want the HTTP surface (with OpenAPI/Swagger UI). The
//! workspace's main `triage-run` binary serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, serve, spawn_housekeeping, AppState};
use triage_core::constants::DEFAULT_REST_ADDR;

/// Main entry point for the standalone REST server
///
/// # Environment Variables
/// - `TRIAGE_REST_ADDR`: bind address (default: "0.0.0.0:3000")
/// - `TRIAGE_FLOW_VARIANT`, `TRIAGE_HIGH_RISK_AGE`, `TRIAGE_FIXTURES_FILE`: see
///   [`core_config_from_env`]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("triage_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("TRIAGE_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let cfg = core_config_from_env()?;
    tracing::info!(
        "flow variant {}, high-risk age {}",
        cfg.flow_variant(),
        cfg.high_risk_age()
    );
    let state = AppState::new(cfg)?;
    spawn_housekeeping(state.clone());

    tracing::info!("-- Starting REST API server on {}", rest_addr);
    serve(&rest_addr, state).await
}
