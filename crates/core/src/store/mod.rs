//! Storage collaborator contract.
//!
//! The intake engine never talks to a database directly. It needs three things from storage: a
//! proximity query for open candidates, a conditional insert, and an atomic corroboration
//! increment. The remaining methods back the administrative pass-through operations.
//!
//! ## Idempotency
//!
//! Both intake writes are keyed by the report's [`ReportId`] so that retrying after an ambiguous
//! failure (timeout after commit) cannot create a second issue or count a report twice:
//!
//! - `create_issue` returns the already-created issue if one exists for `origin_report`.
//! - `increment_corroboration` is a no-op (returning the current record) if the report was
//!   already counted for that issue, including as its origin.

mod memory;

pub use memory::InMemoryIssueStore;

use crate::issue::{Issue, IssueStatus, NewIssue};
use crate::StoreError;
use chrono::{DateTime, Utc};
use civic_ids::{IssueId, ReportId};
use civic_types::Coordinates;
use serde::Serialize;

/// Parameters of the proximity query for dedup candidates.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateQuery {
    pub category: String,
    pub center: Coordinates,
    pub radius_meters: f64,
    /// Only issues created at or after this instant. `None` means any age.
    pub since: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<String>,
    pub region: Option<String>,
    /// Exact match on the opaque reporter reference.
    pub reporter: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IssuePage {
    pub issues: Vec<Issue>,
    /// Number of issues matching the filter, ignoring pagination.
    pub total: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub submitted: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: IssueStatus) {
        match status {
            IssueStatus::Submitted => self.submitted += 1,
            IssueStatus::InProgress => self.in_progress += 1,
            IssueStatus::Resolved => self.resolved += 1,
            IssueStatus::Rejected => self.rejected += 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecentIssue {
    pub id: IssueId,
    pub title: Option<String>,
    pub status: IssueStatus,
    pub category: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_issues: usize,
    pub by_status: StatusCounts,
    pub by_category: Vec<KeyCount>,
    pub by_region: Vec<KeyCount>,
    pub recent: Vec<RecentIssue>,
    /// Mean hours from creation to last update over resolved issues; 0 when none are resolved.
    pub avg_resolution_hours: f64,
}

/// Persistence for issues.
///
/// Implementations must be safe to call from several threads at once. Transient failures
/// (timeouts, dropped connections) are reported as [`StoreError::Transient`] and will be retried
/// by the caller, so every write must be idempotent in the sense described in the module docs.
pub trait IssueStore: Send + Sync {
    /// Open issues of `query.category` within `query.radius_meters` of `query.center`, nearest
    /// first, then earliest created.
    fn query_open_candidates(&self, query: &CandidateQuery) -> Result<Vec<Issue>, StoreError>;

    /// Insert a new issue unless one already exists for `new_issue.origin_report`.
    fn create_issue(&self, new_issue: NewIssue) -> Result<Issue, StoreError>;

    /// Add one corroborating report to an issue and refresh its update timestamp.
    fn increment_corroboration(
        &self,
        issue_id: IssueId,
        report_id: ReportId,
        at: DateTime<Utc>,
    ) -> Result<Issue, StoreError>;

    fn get_issue(&self, issue_id: IssueId) -> Result<Issue, StoreError>;

    fn update_status(
        &self,
        issue_id: IssueId,
        status: IssueStatus,
        at: DateTime<Utc>,
    ) -> Result<Issue, StoreError>;

    /// Matching issues newest first.
    fn list_issues(&self, filter: &IssueFilter) -> Result<IssuePage, StoreError>;

    fn dashboard_stats(&self) -> Result<DashboardStats, StoreError>;
}
