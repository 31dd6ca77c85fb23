//! Duplicate detection.
//!
//! The store narrows the field with a proximity query; this module makes the final, deterministic
//! choice over whatever candidates came back. It re-checks every condition itself so a store that
//! over-fetches (a bounding box instead of a circle, a stale status) cannot cause a wrong merge.

use crate::config::DedupPolicy;
use crate::geo::distance_meters;
use crate::issue::Issue;
use chrono::{DateTime, Utc};
use civic_types::Coordinates;

/// The existing issue a report should merge into.
#[derive(Clone, Debug, PartialEq)]
pub struct DuplicateMatch {
    pub issue: Issue,
    pub distance_meters: f64,
}

fn same_category(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Pick the existing issue a new report duplicates, if any.
///
/// A candidate qualifies when it has the same category (case-insensitive), still accepts
/// duplicates, was created inside the policy's recency window relative to `now`, and lies within
/// the policy radius (inclusive). Among qualifying candidates the nearest wins; exact distance
/// ties go to the earliest created, then to the smaller id.
pub fn find_duplicate(
    category: &str,
    at: Coordinates,
    policy: &DedupPolicy,
    now: DateTime<Utc>,
    candidates: &[Issue],
) -> Option<DuplicateMatch> {
    let since = policy.eligible_since(now);

    candidates
        .iter()
        .filter(|issue| same_category(&issue.category, category))
        .filter(|issue| issue.status.accepts_duplicates())
        .filter(|issue| since.map_or(true, |since| issue.created_at >= since))
        .map(|issue| (issue, distance_meters(at, issue.coordinates)))
        .filter(|(_, distance)| policy.within_radius(*distance))
        .min_by(|(a, da), (b, db)| {
            da.total_cmp(db)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|(issue, distance)| DuplicateMatch {
            issue: issue.clone(),
            distance_meters: distance,
        })
}
