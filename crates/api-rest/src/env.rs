//! Startup configuration from the process environment.
//!
//! Read once when a binary boots. Handlers never consult the environment.

use crate::AppState;
use civic_core::config::{
    dedup_policy_from_env_values, retry_policy_from_env_value, severity_table_from_env_value,
};
use civic_core::severity::estimator_from_env_value;
use civic_core::{CoreConfig, InMemoryIssueStore, SeverityAnalyzer};
use std::sync::Arc;

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

pub fn rest_addr_from_env() -> String {
    std::env::var("CIVIC_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into())
}

/// Build the application state from `CIVIC_*` environment variables.
///
/// # Environment Variables
/// - `CIVIC_DEDUP_POLICY`: `scored` (default, 20 m / 24 h) or `simple` (100 m, no window)
/// - `CIVIC_DEDUP_RADIUS_METERS`: overrides the policy radius
/// - `CIVIC_DEDUP_WINDOW_HOURS`: overrides the policy window; `0` disables it
/// - `CIVIC_RETRY_MAX_ATTEMPTS`: storage attempts per call (default 3)
/// - `CIVIC_SEVERITY_TABLE`: path to a YAML decision table (default: built-in table)
/// - `CIVIC_IMAGE_ESTIMATOR`: `none` (default) or `random`
///
/// # Errors
/// Returns an error if any value is malformed or the severity table cannot be loaded.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let var = |name: &str| std::env::var(name).ok();

    let dedup = dedup_policy_from_env_values(
        var("CIVIC_DEDUP_POLICY"),
        var("CIVIC_DEDUP_RADIUS_METERS"),
        var("CIVIC_DEDUP_WINDOW_HOURS"),
    )?;
    let retry = retry_policy_from_env_value(var("CIVIC_RETRY_MAX_ATTEMPTS"))?;
    let table = severity_table_from_env_value(var("CIVIC_SEVERITY_TABLE"))?;
    let estimator = estimator_from_env_value(var("CIVIC_IMAGE_ESTIMATOR"))?;

    tracing::info!(
        radius_meters = dedup.radius_meters(),
        window_hours = dedup.recency_window().map(|w| w.num_hours()),
        max_attempts = retry.max_attempts(),
        categories = table.categories.len(),
        ?estimator,
        "intake configuration resolved"
    );

    let cfg = CoreConfig::default().with_dedup(dedup).with_retry(retry);
    let analyzer = SeverityAnalyzer::new(Arc::new(table), estimator);

    Ok(AppState::new(
        Arc::new(InMemoryIssueStore::new()),
        analyzer,
        Arc::new(cfg),
    ))
}
