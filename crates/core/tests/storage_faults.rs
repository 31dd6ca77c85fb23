//! Transient storage failure handling.
//!
//! `FlakyStore` wraps the in-memory store and injects failures per operation, either before the
//! write happens or after it has committed (an ambiguous timeout).

use chrono::{DateTime, Utc};
use civic_core::store::{CandidateQuery, DashboardStats, IssueFilter, IssuePage};
use civic_core::{
    CoreConfig, InMemoryIssueStore, IntakeError, IntakeService, Issue, IssueId, IssueStatus,
    IssueStore, NewIssue, Report, ReportId, RetryPolicy, SeverityAnalyzer, StoreError,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Faults {
    /// Fail this many calls before touching the inner store.
    before: AtomicU32,
    /// Fail this many calls after the inner store has applied them.
    after: AtomicU32,
    calls: AtomicU32,
}

impl Faults {
    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn run<T>(&self, op: impl FnOnce() -> Result<T, StoreError>) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if Self::take(&self.before) {
            return Err(StoreError::Transient("connection reset".into()));
        }
        let value = op()?;
        if Self::take(&self.after) {
            return Err(StoreError::Transient("timed out waiting for reply".into()));
        }
        Ok(value)
    }
}

#[derive(Default)]
struct FlakyStore {
    inner: InMemoryIssueStore,
    query: Faults,
    create: Faults,
    increment: Faults,
}

impl IssueStore for FlakyStore {
    fn query_open_candidates(&self, query: &CandidateQuery) -> Result<Vec<Issue>, StoreError> {
        self.query.run(|| self.inner.query_open_candidates(query))
    }

    fn create_issue(&self, new_issue: NewIssue) -> Result<Issue, StoreError> {
        self.create.run(|| self.inner.create_issue(new_issue))
    }

    fn increment_corroboration(
        &self,
        issue_id: IssueId,
        report_id: ReportId,
        at: DateTime<Utc>,
    ) -> Result<Issue, StoreError> {
        self.increment
            .run(|| self.inner.increment_corroboration(issue_id, report_id, at))
    }

    fn get_issue(&self, issue_id: IssueId) -> Result<Issue, StoreError> {
        self.inner.get_issue(issue_id)
    }

    fn update_status(
        &self,
        issue_id: IssueId,
        status: IssueStatus,
        at: DateTime<Utc>,
    ) -> Result<Issue, StoreError> {
        self.inner.update_status(issue_id, status, at)
    }

    fn list_issues(&self, filter: &IssueFilter) -> Result<IssuePage, StoreError> {
        self.inner.list_issues(filter)
    }

    fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        self.inner.dashboard_stats()
    }
}

fn report() -> Report {
    serde_json::from_value(serde_json::json!({
        "category": "Waste Management",
        "specific_issue": "Overflowing Bin",
        "description": "garbage bin overflowing onto the footpath",
        "region": "Dhanbad",
        "latitude": 23.7957,
        "longitude": 86.4304
    }))
    .expect("report json")
}

fn service(store: Arc<FlakyStore>, attempts: u32) -> IntakeService {
    let cfg = CoreConfig::default().with_retry(RetryPolicy::immediate(attempts).unwrap());
    IntakeService::new(store, SeverityAnalyzer::default(), Arc::new(cfg))
}

#[test]
fn test_transient_query_failure_is_retried() {
    let store = Arc::new(FlakyStore::default());
    store.query.before.store(2, Ordering::SeqCst);

    let outcome = service(store.clone(), 3).submit(report()).unwrap();

    assert!(!outcome.is_merged());
    assert_eq!(store.query.calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.inner.len(), 1);
}

#[test]
fn test_exhausted_query_commits_nothing() {
    let store = Arc::new(FlakyStore::default());
    store.query.before.store(10, Ordering::SeqCst);

    let err = service(store.clone(), 3).submit(report()).unwrap_err();

    assert!(matches!(
        err,
        IntakeError::RetriesExhausted {
            operation: "query_open_candidates",
            attempts: 3,
            ..
        }
    ));
    assert!(err.is_retryable());
    assert_eq!(store.create.calls.load(Ordering::SeqCst), 0);
    assert!(store.inner.is_empty());
}

#[test]
fn test_exhausted_create_commits_nothing() {
    let store = Arc::new(FlakyStore::default());
    store.create.before.store(10, Ordering::SeqCst);

    let err = service(store.clone(), 2).submit(report()).unwrap_err();

    assert!(matches!(
        err,
        IntakeError::RetriesExhausted {
            operation: "create_issue",
            ..
        }
    ));
    assert!(store.inner.is_empty());
}

#[test]
fn test_create_timeout_after_commit_does_not_duplicate() {
    let store = Arc::new(FlakyStore::default());
    store.create.after.store(1, Ordering::SeqCst);

    let outcome = service(store.clone(), 3).submit(report()).unwrap();

    assert_eq!(store.create.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.inner.len(), 1);
    assert_eq!(outcome.issue().corroboration_count, 1);
}

#[test]
fn test_increment_timeout_after_commit_counts_once() {
    let store = Arc::new(FlakyStore::default());
    let intake = service(store.clone(), 3);
    let first = intake.submit(report()).unwrap();

    store.increment.after.store(1, Ordering::SeqCst);
    let second = intake.submit(report()).unwrap();

    assert!(second.is_merged());
    assert_eq!(second.issue().id, first.issue().id);
    assert_eq!(second.issue().corroboration_count, 2);
    assert_eq!(store.increment.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_permanent_failure_is_not_retried() {
    struct BrokenStore;

    impl IssueStore for BrokenStore {
        fn query_open_candidates(&self, _: &CandidateQuery) -> Result<Vec<Issue>, StoreError> {
            Err(StoreError::Permanent("schema mismatch".into()))
        }
        fn create_issue(&self, _: NewIssue) -> Result<Issue, StoreError> {
            unreachable!("create after failed query")
        }
        fn increment_corroboration(
            &self,
            _: IssueId,
            _: ReportId,
            _: DateTime<Utc>,
        ) -> Result<Issue, StoreError> {
            unreachable!("increment after failed query")
        }
        fn get_issue(&self, id: IssueId) -> Result<Issue, StoreError> {
            Err(StoreError::NotFound(id))
        }
        fn update_status(
            &self,
            id: IssueId,
            _: IssueStatus,
            _: DateTime<Utc>,
        ) -> Result<Issue, StoreError> {
            Err(StoreError::NotFound(id))
        }
        fn list_issues(&self, _: &IssueFilter) -> Result<IssuePage, StoreError> {
            Err(StoreError::Permanent("schema mismatch".into()))
        }
        fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
            Err(StoreError::Permanent("schema mismatch".into()))
        }
    }

    let cfg = CoreConfig::default().with_retry(RetryPolicy::immediate(5).unwrap());
    let intake = IntakeService::new(
        Arc::new(BrokenStore),
        SeverityAnalyzer::default(),
        Arc::new(cfg),
    );

    let err = intake.submit(report()).unwrap_err();
    assert!(matches!(err, IntakeError::Storage(msg) if msg.contains("schema")));
    assert!(!IntakeError::Storage(String::new()).is_retryable());
}
