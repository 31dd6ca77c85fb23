//! # API REST
//!
//! REST API implementation for the civic intake engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, status codes, CORS)
//!
//! Uses `api-shared` for wire types and `civic-core` for everything else. Engine calls are
//! synchronous and may sleep between storage retries, so handlers run them on the blocking pool.

#![warn(rust_2018_idioms)]

mod convert;
pub mod env;

use api_shared::{
    AnalyzeSeverityReq, AssessmentRes, DashboardStatsRes, ErrorRes, HealthRes, HealthService,
    IssueRes, KeyCountRes, ListIssuesQuery, ListIssuesRes, RecentIssueRes, ReportIssueReq,
    ReportIssueRes, StatusCountsRes, UpdateStatusReq,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use civic_core::{
    CoreConfig, IntakeError, IntakeResult, IntakeService, IssueAdminService, IssueStore,
    ListParams, SeverityAnalyzer,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    intake: IntakeService,
    admin: IssueAdminService,
}

impl AppState {
    /// Both services share `store`, so admin changes are visible to intake and vice versa.
    pub fn new(
        store: Arc<dyn IssueStore>,
        analyzer: SeverityAnalyzer,
        cfg: Arc<CoreConfig>,
    ) -> Self {
        Self {
            intake: IntakeService::new(store.clone(), analyzer, cfg),
            admin: IssueAdminService::new(store),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        analyze_severity,
        report_issue,
        list_issues,
        get_issue,
        update_issue_status,
        dashboard_stats,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        AnalyzeSeverityReq,
        AssessmentRes,
        ReportIssueReq,
        ReportIssueRes,
        IssueRes,
        ListIssuesRes,
        UpdateStatusReq,
        DashboardStatsRes,
        StatusCountsRes,
        KeyCountRes,
        RecentIssueRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/severity/analyze", post(analyze_severity))
        .route("/issues/report", post(report_issue))
        .route("/issues", get(list_issues))
        .route("/issues/:id", get(get_issue))
        .route("/issues/:id/status", put(update_issue_status))
        .route("/dashboard/stats", get(dashboard_stats))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(err: IntakeError) -> ApiError {
    let status = match &err {
        IntakeError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        IntakeError::NotFound(_) => StatusCode::NOT_FOUND,
        IntakeError::TransientStorage(_) | IntakeError::RetriesExhausted { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {:?}", err);
    } else {
        tracing::warn!("Request rejected: {}", err);
    }

    let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal error".to_string()
    } else {
        err.to_string()
    };
    (status, Json(ErrorRes { error }))
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> IntakeResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(api_error),
        Err(e) => {
            tracing::error!("Blocking task failed: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: "Internal error".into(),
                }),
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/severity/analyze",
    request_body = AnalyzeSeverityReq,
    responses(
        (status = 200, description = "Severity assessment", body = AssessmentRes),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Assess a report's severity without storing anything.
#[axum::debug_handler]
async fn analyze_severity(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeSeverityReq>,
) -> Result<Json<AssessmentRes>, ApiError> {
    let request = convert::analyze_req_to_request(req);
    let assessment = run_blocking(move || state.intake.analyze(request)).await?;
    Ok(Json(convert::assessment_res(&assessment)))
}

#[utoipa::path(
    post,
    path = "/issues/report",
    request_body = ReportIssueReq,
    responses(
        (status = 201, description = "New issue created", body = ReportIssueRes),
        (status = 200, description = "Merged into an existing nearby issue", body = ReportIssueRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 503, description = "Storage unavailable; safe to resubmit", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Submit a citizen report.
///
/// The report is assessed, then either merged into an open issue of the same category nearby or
/// stored as a new issue. The assessment is returned in both cases.
///
/// # Errors
/// - `400` if the category or description is blank, the coordinates are out of range, or the
///   severity score is outside 1..=5.
/// - `503` if storage stayed unavailable after retries.
#[axum::debug_handler]
async fn report_issue(
    State(state): State<AppState>,
    Json(req): Json<ReportIssueReq>,
) -> Result<(StatusCode, Json<ReportIssueRes>), ApiError> {
    let report = convert::report_req_to_report(req).map_err(api_error)?;
    let outcome = run_blocking(move || state.intake.submit(report)).await?;

    let status = if outcome.is_merged() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(convert::outcome_res(&outcome))))
}

#[utoipa::path(
    get,
    path = "/issues",
    params(ListIssuesQuery),
    responses(
        (status = 200, description = "Issues, newest first", body = ListIssuesRes),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// List issues with optional status, category, region and reporter filters.
#[axum::debug_handler]
async fn list_issues(
    State(state): State<AppState>,
    Query(query): Query<ListIssuesQuery>,
) -> Result<Json<ListIssuesRes>, ApiError> {
    let params = ListParams {
        status: query.status,
        category: query.category,
        region: query.region,
        reporter: query.reporter,
        limit: query.limit,
        offset: query.offset,
    };
    let page = run_blocking(move || state.admin.list_issues(params)).await?;
    Ok(Json(ListIssuesRes {
        total: page.total,
        issues: page.issues.into_iter().map(convert::issue_res).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/issues/{id}",
    params(("id" = String, Path, description = "Issue id (32 lowercase hex characters)")),
    responses(
        (status = 200, description = "Issue", body = IssueRes),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 404, description = "No such issue", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_issue(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<IssueRes>, ApiError> {
    let issue = run_blocking(move || state.admin.get_issue(&id)).await?;
    Ok(Json(convert::issue_res(issue)))
}

#[utoipa::path(
    put,
    path = "/issues/{id}/status",
    params(("id" = String, Path, description = "Issue id (32 lowercase hex characters)")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Updated issue", body = IssueRes),
        (status = 400, description = "Malformed id or unknown status", body = ErrorRes),
        (status = 404, description = "No such issue", body = ErrorRes)
    )
)]
/// Set an issue's status: `submitted`, `in_progress`, `resolved` or `rejected`.
///
/// Resolved issues stop absorbing new reports.
#[axum::debug_handler]
async fn update_issue_status(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateStatusReq>,
) -> Result<Json<IssueRes>, ApiError> {
    let issue = run_blocking(move || state.admin.update_status(&id, &req.status)).await?;
    Ok(Json(convert::issue_res(issue)))
}

#[utoipa::path(
    get,
    path = "/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStatsRes)
    )
)]
#[axum::debug_handler]
async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStatsRes>, ApiError> {
    let stats = run_blocking(move || state.admin.dashboard_stats()).await?;
    Ok(Json(convert::dashboard_res(stats)))
}
