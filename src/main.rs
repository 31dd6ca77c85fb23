use api_shared::HealthService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the civic intake service
///
/// Serves the REST API (with Swagger UI) until interrupted.
///
/// # Environment Variables
/// - `CIVIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CIVIC_DEDUP_POLICY`, `CIVIC_DEDUP_RADIUS_METERS`, `CIVIC_DEDUP_WINDOW_HOURS`: duplicate
///   detection policy
/// - `CIVIC_RETRY_MAX_ATTEMPTS`: storage attempts per call
/// - `CIVIC_SEVERITY_TABLE`: path to a YAML severity decision table
/// - `CIVIC_IMAGE_ESTIMATOR`: `none` or `random`
///
/// # Returns
/// * `Ok(())` - If the server shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("civic=info".parse()?)
                .add_directive("civic_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = api_rest::env::rest_addr_from_env();
    let state = api_rest::env::state_from_env()?;

    tracing::info!("++ Starting civic intake REST on {}", rest_addr);
    tracing::info!("++ {}", HealthService::check_health().message);

    let app = api_rest::router(state);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {:?}", e);
            }
        })
        .await?;

    tracing::info!("-- civic intake stopped");
    Ok(())
}
