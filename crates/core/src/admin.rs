//! Administrative operations over stored issues.
//!
//! Thin pass-through to the [`IssueStore`]: argument parsing and bounds, no dedup policy. Status
//! changes do not take the intake area locks; a status flip racing an intake merge resolves in
//! whichever order the store applies them.

use crate::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use crate::issue::{Issue, IssueStatus};
use crate::store::{DashboardStats, IssueFilter, IssuePage, IssueStore};
use crate::{IntakeError, IntakeResult};
use chrono::Utc;
use civic_ids::IssueId;
use std::sync::Arc;

/// Listing parameters as received from a caller. Blank strings mean "no filter".
#[derive(Clone, Debug, Default)]
pub struct ListParams {
    pub status: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    /// Only issues filed by this reporter reference.
    pub reporter: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Clone)]
pub struct IssueAdminService {
    store: Arc<dyn IssueStore>,
}

impl IssueAdminService {
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        Self { store }
    }

    fn parse_id(issue_id: &str) -> IntakeResult<IssueId> {
        Ok(IssueId::parse(issue_id.trim())?)
    }

    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` if no such issue exists.
    pub fn get_issue(&self, issue_id: &str) -> IntakeResult<Issue> {
        let id = Self::parse_id(issue_id)?;
        Ok(self.store.get_issue(id)?)
    }

    /// Set an issue's status. `status` must be one of the wire names (`submitted`,
    /// `in_progress`, `resolved`, `rejected`).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id or unknown status, `NotFound` if no such issue exists.
    pub fn update_status(&self, issue_id: &str, status: &str) -> IntakeResult<Issue> {
        let id = Self::parse_id(issue_id)?;
        let status: IssueStatus = status.parse()?;
        let issue = self.store.update_status(id, status, Utc::now())?;
        tracing::info!(issue_id = %issue.id, status = %issue.status, "issue status updated");
        Ok(issue)
    }

    /// List issues newest first.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown status or a limit of zero or above the maximum.
    pub fn list_issues(&self, params: ListParams) -> IntakeResult<IssuePage> {
        let non_blank =
            |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let status = non_blank(params.status)
            .map(|s| s.parse::<IssueStatus>())
            .transpose()?;

        let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if limit == 0 || limit > MAX_LIST_LIMIT {
            return Err(IntakeError::InvalidArgument(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}, got {limit}"
            )));
        }

        let filter = IssueFilter {
            status,
            category: non_blank(params.category),
            region: non_blank(params.region),
            reporter: non_blank(params.reporter),
            limit,
            offset: params.offset.unwrap_or(0),
        };
        Ok(self.store.list_issues(&filter)?)
    }

    pub fn dashboard_stats(&self) -> IntakeResult<DashboardStats> {
        Ok(self.store.dashboard_stats()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::NewIssue;
    use crate::store::InMemoryIssueStore;
    use civic_ids::ReportId;
    use civic_types::Coordinates;

    fn seeded(n: usize) -> (IssueAdminService, Vec<Issue>) {
        let store = Arc::new(InMemoryIssueStore::new());
        let created = (0..n)
            .map(|i| {
                store
                    .create_issue(NewIssue {
                        origin_report: ReportId::new(),
                        title: None,
                        category: if i % 2 == 0 { "Roads & Transport" } else { "Electricity" }
                            .into(),
                        specific_issue: "Pothole".into(),
                        description: "hole in road".into(),
                        region: "Ranchi".into(),
                        coordinates: Coordinates::new(23.0 + i as f64 * 0.01, 85.0).unwrap(),
                        location_address: None,
                        image_refs: vec![],
                        reporter: None,
                        severity_score: 3,
                        created_at: Utc::now() + chrono::Duration::seconds(i as i64),
                    })
                    .unwrap()
            })
            .collect();
        (IssueAdminService::new(store), created)
    }

    #[test]
    fn test_update_status_parses_and_persists() {
        let (admin, issues) = seeded(1);
        let id = issues[0].id.to_string();

        let updated = admin.update_status(&id, "in_progress").unwrap();
        assert_eq!(updated.status, IssueStatus::InProgress);
        assert_eq!(admin.get_issue(&id).unwrap().status, IssueStatus::InProgress);
    }

    #[test]
    fn test_update_status_rejects_unknown_status() {
        let (admin, issues) = seeded(1);
        let err = admin
            .update_status(&issues[0].id.to_string(), "closed")
            .unwrap_err();
        assert!(matches!(err, IntakeError::InvalidArgument(msg) if msg.contains("closed")));
    }

    #[test]
    fn test_get_issue_errors() {
        let (admin, _) = seeded(0);
        assert!(matches!(
            admin.get_issue("not-an-id"),
            Err(IntakeError::InvalidArgument(_))
        ));
        assert!(matches!(
            admin.get_issue(&IssueId::new().to_string()),
            Err(IntakeError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_defaults_to_twenty() {
        let (admin, _) = seeded(25);
        let page = admin.list_issues(ListParams::default()).unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.issues.len(), 20);
    }

    #[test]
    fn test_list_filters_by_status_and_category() {
        let (admin, issues) = seeded(4);
        admin
            .update_status(&issues[0].id.to_string(), "resolved")
            .unwrap();

        let resolved = admin
            .list_issues(ListParams {
                status: Some("resolved".into()),
                ..ListParams::default()
            })
            .unwrap();
        assert_eq!(resolved.total, 1);

        let electricity = admin
            .list_issues(ListParams {
                category: Some("electricity".into()),
                status: Some("  ".into()),
                ..ListParams::default()
            })
            .unwrap();
        assert_eq!(electricity.total, 2);
    }

    #[test]
    fn test_list_limit_bounds() {
        let (admin, _) = seeded(1);
        for limit in [0, MAX_LIST_LIMIT + 1] {
            assert!(matches!(
                admin.list_issues(ListParams {
                    limit: Some(limit),
                    ..ListParams::default()
                }),
                Err(IntakeError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_dashboard_stats_pass_through() {
        let (admin, _) = seeded(3);
        let stats = admin.dashboard_stats().unwrap();
        assert_eq!(stats.total_issues, 3);
        assert_eq!(stats.by_status.submitted, 3);
    }
}
