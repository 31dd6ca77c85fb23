//! Canonical identifiers for issues and reports.
//!
//! Identifiers handed out by the intake engine use a *canonical* UUID representation:
//! **32 lowercase hexadecimal characters** (no hyphens).
//!
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Canonical form is *required* for externally supplied identifiers (path parameters, CLI
//! arguments, client-supplied report ids). Non-canonical values (uppercase, hyphenated, wrong
//! length, non-hex) are rejected rather than normalised, so the same issue can never be addressed
//! by two different strings.
//!
//! Two distinct newtypes exist so an [`IssueId`] can never be passed where a [`ReportId`] is
//! expected. A `ReportId` doubles as the idempotency key for intake writes.

mod ids;

pub use ids::{IssueId, ReportId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
