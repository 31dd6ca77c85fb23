//! Input validation for incoming reports.
//!
//! A [`Report`] is whatever the caller sent. [`validate_report`] turns it into a
//! [`ValidatedReport`] or fails with `IntakeError::InvalidArgument` before any analysis or
//! storage work happens. Standalone analysis takes an [`AnalysisRequest`], which carries no
//! location, through [`validate_analysis`].

use crate::constants::{MAX_SEVERITY, MIN_SEVERITY};
use crate::{IntakeError, IntakeResult};
use civic_ids::ReportId;
use civic_types::{Coordinates, NonEmptyText};
use serde::Deserialize;

/// Raw citizen report as received.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Report {
    /// Client-chosen idempotency key. Generated on arrival when absent.
    #[serde(default)]
    pub report_id: Option<ReportId>,
    #[serde(default)]
    pub title: Option<String>,
    pub category: String,
    /// Blank means "same as category".
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
    pub image_refs: Vec<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    /// Severity the client computed itself (e.g. from a prior analyze call). Only range-checked;
    /// the stored score always comes from the engine's own assessment.
    #[serde(default)]
    pub claimed_severity: Option<i64>,
}

/// A report that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedReport {
    pub report_id: ReportId,
    pub title: Option<String>,
    pub category: NonEmptyText,
    pub specific_issue: String,
    pub description: NonEmptyText,
    pub region: String,
    pub coordinates: Coordinates,
    pub location_address: Option<String>,
    pub image_refs: Vec<String>,
    pub reporter: Option<String>,
    pub claimed_severity: Option<u8>,
}

impl ValidatedReport {
    /// The image the analyzer looks at: the first non-blank reference.
    pub fn primary_image(&self) -> Option<&str> {
        self.image_refs.first().map(String::as_str)
    }

    /// The parts of the report the analyzer scores.
    pub fn analysis(&self) -> ValidatedAnalysis {
        ValidatedAnalysis {
            category: self.category.clone(),
            specific_issue: self.specific_issue.clone(),
            description: self.description.clone(),
            region: self.region.clone(),
            image_ref: self.primary_image().map(str::to_string),
        }
    }
}

/// Inputs of a standalone severity analysis. Location plays no part in scoring.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnalysisRequest {
    pub category: String,
    /// Blank means "same as category".
    #[serde(default)]
    pub specific_issue: String,
    pub description: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// An analysis request that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedAnalysis {
    pub category: NonEmptyText,
    pub specific_issue: String,
    pub description: NonEmptyText,
    pub region: String,
    pub image_ref: Option<String>,
}

fn required_text(value: &str, field: &str) -> IntakeResult<NonEmptyText> {
    NonEmptyText::new(value)
        .map_err(|_| IntakeError::InvalidArgument(format!("{field} is required")))
}

fn issue_or_category(specific_issue: &str, category: &NonEmptyText) -> String {
    match specific_issue.trim() {
        "" => category.as_str().to_string(),
        issue => issue.to_string(),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate a raw report.
///
/// # Errors
///
/// Returns `IntakeError::InvalidArgument` if the category or description is blank, the
/// coordinates are out of range, or a claimed severity lies outside [1, 5].
pub fn validate_report(report: Report) -> IntakeResult<ValidatedReport> {
    let category = required_text(&report.category, "category")?;
    let description = required_text(&report.description, "description")?;
    let coordinates = Coordinates::new(report.latitude, report.longitude)?;

    let claimed_severity = match report.claimed_severity {
        None => None,
        Some(score) => {
            if !(i64::from(MIN_SEVERITY)..=i64::from(MAX_SEVERITY)).contains(&score) {
                return Err(IntakeError::InvalidArgument(format!(
                    "severity score must be between {MIN_SEVERITY} and {MAX_SEVERITY}, got {score}"
                )));
            }
            u8::try_from(score).ok()
        }
    };

    let specific_issue = issue_or_category(&report.specific_issue, &category);

    let image_refs = report
        .image_refs
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();

    Ok(ValidatedReport {
        report_id: report.report_id.unwrap_or_default(),
        title: optional_text(report.title),
        category,
        specific_issue,
        description,
        region: report.region.trim().to_string(),
        coordinates,
        location_address: optional_text(report.location_address),
        image_refs,
        reporter: optional_text(report.reporter),
        claimed_severity,
    })
}

/// Validate a standalone analysis request.
///
/// # Errors
///
/// Returns `IntakeError::InvalidArgument` if the category or description is blank.
pub fn validate_analysis(request: AnalysisRequest) -> IntakeResult<ValidatedAnalysis> {
    let category = required_text(&request.category, "category")?;
    let description = required_text(&request.description, "description")?;
    let specific_issue = issue_or_category(&request.specific_issue, &category);

    Ok(ValidatedAnalysis {
        category,
        specific_issue,
        description,
        region: request.region.trim().to_string(),
        image_ref: optional_text(request.image_ref),
    })
}
