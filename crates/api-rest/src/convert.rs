//! Conversions between wire DTOs and core types.

use api_shared::{
    AnalyzeSeverityReq, AssessmentRes, DashboardStatsRes, IssueRes, KeyCountRes,
    ReportIssueReq, ReportIssueRes, RecentIssueRes, StatusCountsRes,
};
use civic_core::store::{DashboardStats, KeyCount};
use civic_core::{
    AnalysisRequest, IntakeError, IntakeOutcome, IntakeResult, Issue, Report, ReportId,
    SeverityAssessment,
};

pub(crate) fn analyze_req_to_request(req: AnalyzeSeverityReq) -> AnalysisRequest {
    AnalysisRequest {
        category: req.category,
        specific_issue: req.specific_issue,
        description: req.description,
        region: req.region,
        image_ref: req.image_url,
    }
}

pub(crate) fn report_req_to_report(req: ReportIssueReq) -> IntakeResult<Report> {
    let report_id = match req.report_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            ReportId::parse(raw)
                .map_err(|_| IntakeError::InvalidArgument(format!("invalid report_id '{raw}'")))?,
        ),
    };

    Ok(Report {
        report_id,
        title: req.title,
        category: req.category,
        specific_issue: req.specific_issue,
        description: req.description,
        region: req.region,
        latitude: req.latitude,
        longitude: req.longitude,
        location_address: req.location_address,
        image_refs: req.image_urls,
        reporter: req.reporter,
        claimed_severity: req.severity_score,
    })
}

pub(crate) fn assessment_res(assessment: &SeverityAssessment) -> AssessmentRes {
    AssessmentRes {
        score: assessment.score(),
        confidence: assessment.confidence(),
        reasoning: assessment.reasoning().to_string(),
        factors: assessment.factors().to_vec(),
    }
}

pub(crate) fn outcome_res(outcome: &IntakeOutcome) -> ReportIssueRes {
    let issue = outcome.issue();
    ReportIssueRes {
        issue_id: issue.id.to_string(),
        merged: outcome.is_merged(),
        corroboration_count: issue.corroboration_count,
        message: outcome.message(),
        assessment: assessment_res(outcome.assessment()),
        distance_meters: match outcome {
            IntakeOutcome::Merged {
                distance_meters, ..
            } => Some(*distance_meters),
            IntakeOutcome::Created { .. } => None,
        },
    }
}

pub(crate) fn issue_res(issue: Issue) -> IssueRes {
    IssueRes {
        id: issue.id.to_string(),
        title: issue.title,
        category: issue.category,
        specific_issue: issue.specific_issue,
        description: issue.description,
        region: issue.region,
        latitude: issue.coordinates.latitude(),
        longitude: issue.coordinates.longitude(),
        location_address: issue.location_address,
        image_urls: issue.image_refs,
        reporter: issue.reporter,
        severity_score: issue.severity_score,
        status: issue.status.to_string(),
        corroboration_count: issue.corroboration_count,
        created_at: issue.created_at.to_rfc3339(),
        updated_at: issue.updated_at.to_rfc3339(),
    }
}

fn key_counts(counts: Vec<KeyCount>) -> Vec<KeyCountRes> {
    counts
        .into_iter()
        .map(|c| KeyCountRes {
            key: c.key,
            count: c.count,
        })
        .collect()
}

pub(crate) fn dashboard_res(stats: DashboardStats) -> DashboardStatsRes {
    DashboardStatsRes {
        total_issues: stats.total_issues,
        by_status: StatusCountsRes {
            submitted: stats.by_status.submitted,
            in_progress: stats.by_status.in_progress,
            resolved: stats.by_status.resolved,
            rejected: stats.by_status.rejected,
        },
        by_category: key_counts(stats.by_category),
        by_region: key_counts(stats.by_region),
        recent_issues: stats
            .recent
            .into_iter()
            .map(|r| RecentIssueRes {
                id: r.id.to_string(),
                title: r.title,
                status: r.status.to_string(),
                category: r.category,
                region: r.region,
                created_at: r.created_at.to_rfc3339(),
            })
            .collect(),
        avg_resolution_hours: stats.avg_resolution_hours,
    }
}
