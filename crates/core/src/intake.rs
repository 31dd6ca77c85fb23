//! Intake orchestration: validate, assess, locate, then merge or create.

use crate::config::CoreConfig;
use crate::issue::{Issue, NewIssue};
use crate::locator::find_duplicate;
use crate::partition::AreaLocks;
use crate::retry::with_retry;
use crate::severity::{SeverityAnalyzer, SeverityAssessment};
use crate::store::{CandidateQuery, IssueStore};
use crate::validation::{
    validate_analysis, validate_report, AnalysisRequest, Report, ValidatedAnalysis,
};
use crate::IntakeResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What happened to a submitted report.
#[derive(Clone, Debug, PartialEq)]
pub enum IntakeOutcome {
    /// No open duplicate nearby; a new issue now exists.
    Created {
        issue: Issue,
        assessment: SeverityAssessment,
    },
    /// The report corroborated an existing issue. `assessment` is feedback for the reporter only;
    /// the issue keeps the score it was created with.
    Merged {
        issue: Issue,
        assessment: SeverityAssessment,
        distance_meters: f64,
    },
}

impl IntakeOutcome {
    pub fn issue(&self) -> &Issue {
        match self {
            IntakeOutcome::Created { issue, .. } | IntakeOutcome::Merged { issue, .. } => issue,
        }
    }

    pub fn assessment(&self) -> &SeverityAssessment {
        match self {
            IntakeOutcome::Created { assessment, .. }
            | IntakeOutcome::Merged { assessment, .. } => assessment,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, IntakeOutcome::Merged { .. })
    }

    /// Caller-facing summary line.
    pub fn message(&self) -> String {
        match self {
            IntakeOutcome::Created { .. } => "Issue reported successfully".to_string(),
            IntakeOutcome::Merged { issue, .. } => format!(
                "Similar issue found nearby. Report count updated to {}.",
                issue.corroboration_count
            ),
        }
    }
}

/// The intake engine.
///
/// Cheap to clone; clones share the store, the analyzer and the area locks, so every clone
/// serializes against the others.
#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn IssueStore>,
    analyzer: SeverityAnalyzer,
    cfg: Arc<CoreConfig>,
    locks: Arc<AreaLocks>,
    clock: Clock,
}

impl std::fmt::Debug for IntakeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeService")
            .field("analyzer", &self.analyzer)
            .field("cfg", &self.cfg)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl IntakeService {
    pub fn new(
        store: Arc<dyn IssueStore>,
        analyzer: SeverityAnalyzer,
        cfg: Arc<CoreConfig>,
    ) -> Self {
        let locks = Arc::new(AreaLocks::new(
            cfg.partition_cell_degrees(),
            cfg.partition_stripes(),
        ));
        Self {
            store,
            analyzer,
            cfg,
            locks,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock. Timestamps and the recency window are evaluated against it.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn analyzer(&self) -> &SeverityAnalyzer {
        &self.analyzer
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Assess a report without touching storage. No location is needed.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidArgument` if the category or description is blank.
    pub fn analyze(&self, request: AnalysisRequest) -> IntakeResult<SeverityAssessment> {
        let request = validate_analysis(request)?;
        Ok(self.assess(&request))
    }

    fn assess(&self, request: &ValidatedAnalysis) -> SeverityAssessment {
        self.analyzer.analyze(
            request.category.as_str(),
            &request.specific_issue,
            request.description.as_str(),
            &request.region,
            request.image_ref.as_deref(),
        )
    }

    /// Take in one citizen report.
    ///
    /// The candidate query and the resulting write run under the area lock for the report's
    /// category and location, so concurrent reports of the same problem produce one issue.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if validation fails; nothing else runs.
    /// - `RetriesExhausted` if storage stayed unavailable; no write was committed by this call
    ///   unless the store committed and then failed to answer, in which case resubmitting the
    ///   same `report_id` is safe.
    /// - `NotFound` / `Storage` for permanent store failures.
    pub fn submit(&self, report: Report) -> IntakeResult<IntakeOutcome> {
        let report = validate_report(report)?;
        let assessment = self.assess(&report.analysis());

        if let Some(claimed) = report.claimed_severity {
            if claimed != assessment.score() {
                tracing::debug!(
                    report_id = %report.report_id,
                    claimed,
                    assessed = assessment.score(),
                    "claimed severity differs from assessment; storing assessment"
                );
            }
        }

        let policy = self.cfg.dedup();
        let retry = self.cfg.retry();

        let _area = self.locks.lock(
            report.category.as_str(),
            report.coordinates,
            policy.radius_meters(),
        );
        let now = (self.clock)();

        let query = CandidateQuery {
            category: report.category.as_str().to_string(),
            center: report.coordinates,
            radius_meters: policy.radius_meters(),
            since: policy.eligible_since(now),
        };
        let candidates = with_retry(retry, "query_open_candidates", || {
            self.store.query_open_candidates(&query)
        })?;

        // A resubmitted report finds the issue it created; answer as the first submission did.
        if let Some(own) = candidates
            .iter()
            .find(|issue| issue.origin_report == report.report_id)
        {
            tracing::info!(
                issue_id = %own.id,
                report_id = %report.report_id,
                "report already created this issue"
            );
            return Ok(IntakeOutcome::Created {
                issue: own.clone(),
                assessment,
            });
        }

        match find_duplicate(
            report.category.as_str(),
            report.coordinates,
            policy,
            now,
            &candidates,
        ) {
            Some(found) => {
                let issue = with_retry(retry, "increment_corroboration", || {
                    self.store
                        .increment_corroboration(found.issue.id, report.report_id, now)
                })?;
                tracing::info!(
                    issue_id = %issue.id,
                    report_id = %report.report_id,
                    distance_meters = found.distance_meters,
                    corroboration_count = issue.corroboration_count,
                    "report merged into existing issue"
                );
                Ok(IntakeOutcome::Merged {
                    issue,
                    assessment,
                    distance_meters: found.distance_meters,
                })
            }
            None => {
                let new_issue = NewIssue {
                    origin_report: report.report_id,
                    title: report.title.clone(),
                    category: report.category.as_str().to_string(),
                    specific_issue: report.specific_issue.clone(),
                    description: report.description.as_str().to_string(),
                    region: report.region.clone(),
                    coordinates: report.coordinates,
                    location_address: report.location_address.clone(),
                    image_refs: report.image_refs.clone(),
                    reporter: report.reporter.clone(),
                    severity_score: assessment.score(),
                    created_at: now,
                };
                let issue = with_retry(retry, "create_issue", || {
                    self.store.create_issue(new_issue.clone())
                })?;
                tracing::info!(
                    issue_id = %issue.id,
                    report_id = %report.report_id,
                    category = %issue.category,
                    severity = issue.severity_score,
                    "new issue created"
                );
                Ok(IntakeOutcome::Created { issue, assessment })
            }
        }
    }
}
