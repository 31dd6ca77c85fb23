//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, with an in-memory issue store.
//!
//! ## Intended use
//! Development and debugging with the OpenAPI/Swagger UI. The workspace's main `civic-run` binary
//! serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the civic REST API server.
///
/// # Environment Variables
/// - `CIVIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CIVIC_*` intake settings, see [`api_rest::env::state_from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the intake configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("civic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = api_rest::env::rest_addr_from_env();
    tracing::info!("-- Starting civic REST API on {}", addr);

    let state = api_rest::env::state_from_env()?;
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
