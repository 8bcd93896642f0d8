use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, serve, spawn_housekeeping, AppState};
use triage_core::constants::DEFAULT_REST_ADDR;

/// Main entry point for the triage application
///
/// Resolves configuration once, loads the dashboard fixtures, starts the housekeeping ticker
/// (clock text, idle session eviction) and serves the REST API (with Swagger UI at
/// `/swagger-ui`).
///
/// # Environment Variables
/// - `TRIAGE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TRIAGE_FLOW_VARIANT`: `role-screen` or `login-gate` (default: "login-gate")
/// - `TRIAGE_HIGH_RISK_AGE`: high-risk age threshold (default: 65)
/// - `TRIAGE_FIXTURES_FILE`: YAML file replacing the built-in demo patients
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, fixtures or the listener fail
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triage_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("triage_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("TRIAGE_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let cfg = core_config_from_env()?;
    tracing::info!(
        "++ Flow variant {}, high-risk age {}",
        cfg.flow_variant(),
        cfg.high_risk_age()
    );

    let state = AppState::new(cfg)?;
    let housekeeping = spawn_housekeeping(state.clone());

    tracing::info!("++ Starting triage REST on {}", rest_addr);
    let result = serve(&rest_addr, state).await;
    housekeeping.abort();
    result
}
