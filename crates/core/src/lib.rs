//! # Civic Core
//!
//! Intake engine for citizen-reported civic issues.
//!
//! This crate contains the domain logic and nothing else:
//! - Severity analysis of a report against a data-driven decision table
//! - Duplicate location by category, great-circle distance and recency
//! - Intake orchestration (merge into an existing issue or create a new one), with bounded
//!   retries and per-area write serialization
//! - A storage contract ([`store::IssueStore`]) plus an in-memory implementation
//!
//! **No API concerns**: HTTP servers, DTOs and OpenAPI belong in `api-rest` and `api-shared`.

pub mod admin;
pub mod config;
pub mod constants;
mod error;
pub mod geo;
pub mod intake;
pub mod issue;
pub mod locator;
pub mod partition;
pub mod retry;
pub mod severity;
pub mod store;
pub mod validation;

pub use admin::{IssueAdminService, ListParams};
pub use config::{CoreConfig, DedupPolicy, RetryPolicy};
pub use error::{IntakeError, IntakeResult, StoreError};
pub use intake::{IntakeOutcome, IntakeService};
pub use issue::{Issue, IssueStatus, NewIssue};
pub use severity::{SeverityAnalyzer, SeverityAssessment, SeverityTable};
pub use store::{InMemoryIssueStore, IssueStore};
pub use validation::{AnalysisRequest, Report};

pub use civic_ids::{IssueId, ReportId};
pub use civic_types::Coordinates;
