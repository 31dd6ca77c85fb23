//! Persisted issue records.

use crate::IntakeError;
use chrono::{DateTime, Utc};
use civic_ids::{IssueId, ReportId};
use civic_types::Coordinates;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Administrative lifecycle of an issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Submitted,
    InProgress,
    Resolved,
    Rejected,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 4] = [
        IssueStatus::Submitted,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Submitted => "submitted",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Rejected => "rejected",
        }
    }

    /// Whether an issue in this status can absorb new reports as duplicates.
    ///
    /// Everything except `resolved` stays open for corroboration.
    pub fn accepts_duplicates(&self) -> bool {
        !matches!(self, IssueStatus::Resolved)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| IntakeError::InvalidArgument(format!("invalid status '{s}'")))
    }
}

/// A deduplicated civic problem, corroborated by one or more reports.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Issue {
    pub id: IssueId,
    /// The report that created this issue.
    pub origin_report: ReportId,
    pub title: Option<String>,
    pub category: String,
    pub specific_issue: String,
    pub description: String,
    pub region: String,
    pub coordinates: Coordinates,
    pub location_address: Option<String>,
    pub image_refs: Vec<String>,
    pub reporter: Option<String>,
    /// Fixed at creation from the originating report's assessment.
    pub severity_score: u8,
    pub status: IssueStatus,
    /// Starts at 1, grows by exactly 1 per accepted duplicate.
    pub corroboration_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new issue, handed to the store's conditional insert.
#[derive(Clone, Debug, PartialEq)]
pub struct NewIssue {
    pub origin_report: ReportId,
    pub title: Option<String>,
    pub category: String,
    pub specific_issue: String,
    pub description: String,
    pub region: String,
    pub coordinates: Coordinates,
    pub location_address: Option<String>,
    pub image_refs: Vec<String>,
    pub reporter: Option<String>,
    pub severity_score: u8,
    pub created_at: DateTime<Utc>,
}

impl NewIssue {
    /// Materialise the record a store persists: submitted, corroborated once.
    pub fn into_issue(self, id: IssueId) -> Issue {
        Issue {
            id,
            origin_report: self.origin_report,
            title: self.title,
            category: self.category,
            specific_issue: self.specific_issue,
            description: self.description,
            region: self.region,
            coordinates: self.coordinates,
            location_address: self.location_address,
            image_refs: self.image_refs,
            reporter: self.reporter,
            severity_score: self.severity_score,
            status: IssueStatus::Submitted,
            corroboration_count: 1,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
