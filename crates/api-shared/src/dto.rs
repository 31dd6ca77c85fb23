//! Wire types for the REST API.
//!
//! Identifiers are canonical 32-character lowercase hex strings and timestamps are RFC 3339
//! strings, so the JSON shape does not depend on the core crate's internal representations.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// JSON error body returned with every non-2xx response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// Request body for `POST /severity/analyze`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeSeverityReq {
    pub category: String,
    #[serde(default)]
    pub specific_issue: String,
    pub description: String,
    #[serde(default)]
    pub region: String,
    /// Opaque image reference. Never fetched; its presence enables the image boost.
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssessmentRes {
    /// 1 (lowest) to 5 (highest).
    pub score: u8,
    /// 0 to 95.
    pub confidence: u8,
    pub reasoning: String,
    pub factors: Vec<String>,
}

/// Request body for `POST /issues/report`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportIssueReq {
    /// Optional client-generated idempotency key (32 lowercase hex characters). Resubmitting a
    /// report with the same key never counts it twice.
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub category: String,
    #[serde(default)]
    pub specific_issue: String,
    pub description: String,
    #[serde(default)]
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub location_address: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    /// Score from an earlier analyze call. Range-checked, never stored.
    #[serde(default)]
    pub severity_score: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportIssueRes {
    pub issue_id: String,
    /// True when the report was merged into an existing nearby issue.
    pub merged: bool,
    pub corroboration_count: u32,
    pub message: String,
    pub assessment: AssessmentRes,
    /// Distance to the merged issue, in meters. Absent for new issues.
    pub distance_meters: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IssueRes {
    pub id: String,
    pub title: Option<String>,
    pub category: String,
    pub specific_issue: String,
    pub description: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_address: Option<String>,
    pub image_urls: Vec<String>,
    pub reporter: Option<String>,
    pub severity_score: u8,
    /// One of `submitted`, `in_progress`, `resolved`, `rejected`.
    pub status: String,
    pub corroboration_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Query string for `GET /issues`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListIssuesQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    /// Only issues filed by this reporter.
    pub reporter: Option<String>,
    /// Page size, 1 to 100. Defaults to 20.
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListIssuesRes {
    pub issues: Vec<IssueRes>,
    pub total: usize,
}

/// Request body for `PUT /issues/{id}/status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCountsRes {
    pub submitted: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub rejected: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KeyCountRes {
    pub key: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecentIssueRes {
    pub id: String,
    pub title: Option<String>,
    pub status: String,
    pub category: String,
    pub region: String,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStatsRes {
    pub total_issues: usize,
    pub by_status: StatusCountsRes,
    pub by_category: Vec<KeyCountRes>,
    pub by_region: Vec<KeyCountRes>,
    pub recent_issues: Vec<RecentIssueRes>,
    pub avg_resolution_hours: f64,
}
