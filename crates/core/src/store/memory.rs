use super::{
    CandidateQuery, DashboardStats, IssueFilter, IssuePage, IssueStore, KeyCount, RecentIssue,
    StatusCounts,
};
use crate::constants::DASHBOARD_TOP_N;
use crate::geo::distance_meters;
use crate::issue::{Issue, IssueStatus, NewIssue};
use crate::StoreError;
use chrono::{DateTime, Utc};
use civic_ids::{IssueId, ReportId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    /// Insertion order.
    issues: Vec<Issue>,
    index: HashMap<IssueId, usize>,
    by_origin: HashMap<ReportId, IssueId>,
    /// Reports already counted per issue, origin included.
    applied: HashMap<IssueId, HashSet<ReportId>>,
}

impl State {
    fn issue_mut(&mut self, issue_id: IssueId) -> Result<&mut Issue, StoreError> {
        let idx = *self
            .index
            .get(&issue_id)
            .ok_or(StoreError::NotFound(issue_id))?;
        Ok(&mut self.issues[idx])
    }
}

/// Process-local issue store.
///
/// Backs the REST server when no external database is configured, the CLI replay command and
/// the test suites. All state lives behind a single `RwLock`; each trait method is atomic with
/// respect to the others.
#[derive(Debug, Default)]
pub struct InMemoryIssueStore {
    state: RwLock<State>,
}

impl InMemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored issues.
    pub fn len(&self) -> usize {
        self.read().map(|s| s.issues.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored issue in insertion order.
    pub fn all_issues(&self) -> Result<Vec<Issue>, StoreError> {
        Ok(self.read()?.issues.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Permanent("issue store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Permanent("issue store lock poisoned".into()))
    }
}

fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn top_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<KeyCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut counts: Vec<KeyCount> = counts
        .into_iter()
        .map(|(key, count)| KeyCount {
            key: key.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the BTreeMap's alphabetical order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(DASHBOARD_TOP_N);
    counts
}

impl IssueStore for InMemoryIssueStore {
    fn query_open_candidates(&self, query: &CandidateQuery) -> Result<Vec<Issue>, StoreError> {
        let state = self.read()?;
        let mut hits: Vec<(f64, &Issue)> = state
            .issues
            .iter()
            .filter(|issue| same_text(&issue.category, &query.category))
            .filter(|issue| issue.status.accepts_duplicates())
            .filter(|issue| query.since.map_or(true, |since| issue.created_at >= since))
            .map(|issue| (distance_meters(query.center, issue.coordinates), issue))
            .filter(|(distance, _)| *distance <= query.radius_meters)
            .collect();

        hits.sort_by(|(da, a), (db, b)| {
            da.total_cmp(db)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(hits.into_iter().map(|(_, issue)| issue.clone()).collect())
    }

    fn create_issue(&self, new_issue: NewIssue) -> Result<Issue, StoreError> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        if let Some(existing) = state.by_origin.get(&new_issue.origin_report).copied() {
            let idx = state.index[&existing];
            return Ok(state.issues[idx].clone());
        }

        let origin = new_issue.origin_report;
        let issue = new_issue.into_issue(IssueId::new());
        let id = issue.id;

        state.index.insert(id, state.issues.len());
        state.issues.push(issue.clone());
        state.by_origin.insert(origin, id);
        state.applied.entry(id).or_default().insert(origin);
        Ok(issue)
    }

    fn increment_corroboration(
        &self,
        issue_id: IssueId,
        report_id: ReportId,
        at: DateTime<Utc>,
    ) -> Result<Issue, StoreError> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        state.issue_mut(issue_id)?;

        let newly_applied = state.applied.entry(issue_id).or_default().insert(report_id);
        let issue = state.issue_mut(issue_id)?;
        if newly_applied {
            issue.corroboration_count = issue.corroboration_count.saturating_add(1);
            issue.updated_at = issue.updated_at.max(at);
        }
        Ok(issue.clone())
    }

    fn get_issue(&self, issue_id: IssueId) -> Result<Issue, StoreError> {
        let state = self.read()?;
        state
            .index
            .get(&issue_id)
            .map(|&idx| state.issues[idx].clone())
            .ok_or(StoreError::NotFound(issue_id))
    }

    fn update_status(
        &self,
        issue_id: IssueId,
        status: IssueStatus,
        at: DateTime<Utc>,
    ) -> Result<Issue, StoreError> {
        let mut guard = self.write()?;
        let issue = guard.issue_mut(issue_id)?;
        issue.status = status;
        issue.updated_at = issue.updated_at.max(at);
        Ok(issue.clone())
    }

    fn list_issues(&self, filter: &IssueFilter) -> Result<IssuePage, StoreError> {
        let state = self.read()?;
        let mut matching: Vec<&Issue> = state
            .issues
            .iter()
            .filter(|issue| filter.status.map_or(true, |s| issue.status == s))
            .filter(|issue| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |c| same_text(&issue.category, c))
            })
            .filter(|issue| {
                filter
                    .region
                    .as_deref()
                    .map_or(true, |r| same_text(&issue.region, r))
            })
            .filter(|issue| {
                filter
                    .reporter
                    .as_deref()
                    .map_or(true, |r| issue.reporter.as_deref() == Some(r))
            })
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len();
        let issues = matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect();

        Ok(IssuePage { issues, total })
    }

    fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let state = self.read()?;

        let mut by_status = StatusCounts::default();
        for issue in &state.issues {
            by_status.record(issue.status);
        }

        let mut recent: Vec<&Issue> = state.issues.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recent = recent
            .into_iter()
            .take(DASHBOARD_TOP_N)
            .map(|issue| RecentIssue {
                id: issue.id,
                title: issue.title.clone(),
                status: issue.status,
                category: issue.category.clone(),
                region: issue.region.clone(),
                created_at: issue.created_at,
            })
            .collect();

        let resolution_hours: Vec<f64> = state
            .issues
            .iter()
            .filter(|issue| issue.status == IssueStatus::Resolved)
            .map(|issue| (issue.updated_at - issue.created_at).num_seconds() as f64 / 3600.0)
            .collect();
        let avg_resolution_hours = if resolution_hours.is_empty() {
            0.0
        } else {
            resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64
        };

        Ok(DashboardStats {
            total_issues: state.issues.len(),
            by_status,
            by_category: top_counts(state.issues.iter().map(|i| i.category.as_str())),
            by_region: top_counts(
                state
                    .issues
                    .iter()
                    .map(|i| i.region.as_str())
                    .filter(|r| !r.is_empty()),
            ),
            recent,
            avg_resolution_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::offset_north;
    use chrono::Duration;
    use civic_types::Coordinates;

    fn origin() -> Coordinates {
        Coordinates::new(23.3441, 85.3096).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn new_issue(
        category: &str,
        region: &str,
        meters_north: f64,
        created_at: DateTime<Utc>,
    ) -> NewIssue {
        NewIssue {
            origin_report: ReportId::new(),
            title: Some(format!("{category} problem")),
            category: category.into(),
            specific_issue: category.into(),
            description: "something is broken".into(),
            region: region.into(),
            coordinates: offset_north(origin(), meters_north).unwrap(),
            location_address: None,
            image_refs: vec![],
            reporter: None,
            severity_score: 3,
            created_at,
        }
    }

    fn query(radius: f64) -> CandidateQuery {
        CandidateQuery {
            category: "Water Supply".into(),
            center: origin(),
            radius_meters: radius,
            since: None,
        }
    }

    #[test]
    fn test_create_is_conditional_on_origin_report() {
        let store = InMemoryIssueStore::new();
        let new = new_issue("Water Supply", "Ranchi", 0.0, t0());

        let first = store.create_issue(new.clone()).unwrap();
        let again = store.create_issue(new).unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(store.len(), 1);
        assert_eq!(first.corroboration_count, 1);
        assert_eq!(first.status, IssueStatus::Submitted);
    }

    #[test]
    fn test_increment_is_idempotent_per_report() {
        let store = InMemoryIssueStore::new();
        let new = new_issue("Water Supply", "Ranchi", 0.0, t0());
        let origin_report = new.origin_report;
        let issue = store.create_issue(new).unwrap();

        let report = ReportId::new();
        let later = t0() + Duration::hours(2);
        let once = store.increment_corroboration(issue.id, report, later).unwrap();
        let twice = store.increment_corroboration(issue.id, report, later).unwrap();
        assert_eq!(once.corroboration_count, 2);
        assert_eq!(twice.corroboration_count, 2);
        assert_eq!(twice.updated_at, later);

        // The origin report already counts.
        let origin_again = store
            .increment_corroboration(issue.id, origin_report, later)
            .unwrap();
        assert_eq!(origin_again.corroboration_count, 2);
    }

    #[test]
    fn test_increment_unknown_issue_is_not_found() {
        let store = InMemoryIssueStore::new();
        let missing = IssueId::new();
        assert_eq!(
            store.increment_corroboration(missing, ReportId::new(), t0()),
            Err(StoreError::NotFound(missing))
        );
    }

    #[test]
    fn test_candidates_sorted_nearest_first_and_filtered() {
        let store = InMemoryIssueStore::new();
        let far = store
            .create_issue(new_issue("Water Supply", "Ranchi", 18.0, t0()))
            .unwrap();
        let near = store
            .create_issue(new_issue("water supply", "Ranchi", 4.0, t0()))
            .unwrap();
        store
            .create_issue(new_issue("Water Supply", "Ranchi", 500.0, t0()))
            .unwrap();
        store
            .create_issue(new_issue("Electricity", "Ranchi", 1.0, t0()))
            .unwrap();
        let resolved = store
            .create_issue(new_issue("Water Supply", "Ranchi", 2.0, t0()))
            .unwrap();
        store
            .update_status(resolved.id, IssueStatus::Resolved, t0())
            .unwrap();

        let hits = store.query_open_candidates(&query(20.0)).unwrap();
        let ids: Vec<IssueId> = hits.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![near.id, far.id]);
    }

    #[test]
    fn test_candidates_respect_since() {
        let store = InMemoryIssueStore::new();
        store
            .create_issue(new_issue("Water Supply", "Ranchi", 1.0, t0()))
            .unwrap();

        let mut q = query(20.0);
        q.since = Some(t0() + Duration::seconds(1));
        assert!(store.query_open_candidates(&q).unwrap().is_empty());

        q.since = Some(t0());
        assert_eq!(store.query_open_candidates(&q).unwrap().len(), 1);
    }

    #[test]
    fn test_list_filters_and_paginates_newest_first() {
        let store = InMemoryIssueStore::new();
        for hour in 0..5 {
            store
                .create_issue(new_issue(
                    "Water Supply",
                    "Ranchi",
                    f64::from(hour) * 1000.0,
                    t0() + Duration::hours(i64::from(hour)),
                ))
                .unwrap();
        }
        store
            .create_issue(new_issue("Electricity", "Dhanbad", 0.0, t0()))
            .unwrap();

        let page = store
            .list_issues(&IssueFilter {
                category: Some("WATER SUPPLY".into()),
                limit: 2,
                offset: 1,
                ..IssueFilter::default()
            })
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.issues.len(), 2);
        assert_eq!(page.issues[0].created_at, t0() + Duration::hours(3));
        assert_eq!(page.issues[1].created_at, t0() + Duration::hours(2));

        let dhanbad = store
            .list_issues(&IssueFilter {
                region: Some("dhanbad".into()),
                limit: 20,
                ..IssueFilter::default()
            })
            .unwrap();
        assert_eq!(dhanbad.total, 1);
    }

    #[test]
    fn test_list_issues_by_reporter() {
        let store = InMemoryIssueStore::new();
        for i in 0..3 {
            let mut issue = new_issue("Water Supply", "Ranchi", i as f64 * 50.0, t0());
            issue.reporter = Some(if i == 1 { "citizen-7" } else { "citizen-9" }.into());
            store.create_issue(issue).unwrap();
        }
        store
            .create_issue(new_issue("Electricity", "Ranchi", 0.0, t0()))
            .unwrap();

        let mine = store
            .list_issues(&IssueFilter {
                reporter: Some("citizen-9".into()),
                limit: 20,
                ..IssueFilter::default()
            })
            .unwrap();
        assert_eq!(mine.total, 2);
        assert!(mine
            .issues
            .iter()
            .all(|issue| issue.reporter.as_deref() == Some("citizen-9")));
    }

    #[test]
    fn test_dashboard_stats() {
        let store = InMemoryIssueStore::new();
        let a = store
            .create_issue(new_issue("Water Supply", "Ranchi", 0.0, t0()))
            .unwrap();
        store
            .create_issue(new_issue("Water Supply", "Dhanbad", 5000.0, t0() + Duration::hours(1)))
            .unwrap();
        store
            .create_issue(new_issue("Electricity", "Ranchi", 0.0, t0() + Duration::hours(2)))
            .unwrap();
        store
            .update_status(a.id, IssueStatus::Resolved, t0() + Duration::hours(6))
            .unwrap();

        let stats = store.dashboard_stats().unwrap();
        assert_eq!(stats.total_issues, 3);
        assert_eq!(stats.by_status.resolved, 1);
        assert_eq!(stats.by_status.submitted, 2);
        assert_eq!(
            stats.by_category[0],
            KeyCount {
                key: "Water Supply".into(),
                count: 2
            }
        );
        assert_eq!(stats.by_region[0].key, "Ranchi");
        assert_eq!(stats.recent.len(), 3);
        assert_eq!(stats.recent[0].category, "Electricity");
        assert!((stats.avg_resolution_hours - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_status_unknown_issue() {
        let store = InMemoryIssueStore::new();
        assert!(matches!(
            store.update_status(IssueId::new(), IssueStatus::Resolved, t0()),
            Err(StoreError::NotFound(_))
        ));
    }
}
