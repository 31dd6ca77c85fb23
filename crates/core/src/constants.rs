//! Constants used throughout the civic core crate.
//!
//! Policy defaults live here so the two intake variants and the analyzer weights can be reviewed
//! in one place.

/// Dedup radius for the AI-scored intake path, in meters.
pub const SCORED_DEDUP_RADIUS_METERS: f64 = 20.0;

/// Recency window for the AI-scored intake path, in hours.
pub const SCORED_DEDUP_WINDOW_HOURS: i64 = 24;

/// Longest recency window a dedup policy accepts, in hours (about one hundred years).
pub const MAX_DEDUP_WINDOW_HOURS: i64 = 876_000;

/// Dedup radius for the simple intake path, in meters. The simple path has no recency window.
pub const SIMPLE_DEDUP_RADIUS_METERS: f64 = 100.0;

/// Mean Earth radius in meters (IUGG), used by the great-circle distance.
pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.8;

/// Length of one degree of latitude in meters, rounded down so derived cell sizes stay
/// conservative.
pub const METERS_PER_DEGREE_LATITUDE: f64 = 111_000.0;

/// Side length of an intake serialization cell, in degrees.
pub const DEFAULT_PARTITION_CELL_DEGREES: f64 = 0.01;

/// Number of lock stripes shared by all intake serialization cells.
pub const DEFAULT_PARTITION_STRIPES: usize = 64;

/// Default number of attempts for a storage call, including the first.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry, in milliseconds. Doubles per attempt.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 50;

/// Upper bound for a single retry delay, in milliseconds.
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 1_000;

/// Default page size for issue listings.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Largest page size a caller may request.
pub const MAX_LIST_LIMIT: usize = 100;

/// Number of rows in each dashboard breakdown.
pub const DASHBOARD_TOP_N: usize = 10;

/// Factor weights for the weighted base score: urgency, public safety, infrastructure, impact.
pub const URGENCY_WEIGHT: f64 = 0.30;
pub const PUBLIC_SAFETY_WEIGHT: f64 = 0.35;
pub const INFRASTRUCTURE_WEIGHT: f64 = 0.20;
pub const IMPACT_WEIGHT: f64 = 0.15;

/// Starting value for every severity factor before the decision table applies.
pub const BASELINE_FACTOR: u8 = 2;

/// Lowest and highest value of a severity score or factor.
pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 5;

/// Confidence bounds and increments.
pub const BASE_CONFIDENCE: u8 = 70;
pub const MAX_CONFIDENCE: u8 = 95;
pub const DETAILED_DESCRIPTION_CHARS: usize = 100;
pub const VERY_DETAILED_DESCRIPTION_CHARS: usize = 200;
pub const DETAIL_CONFIDENCE_BONUS: u8 = 10;
pub const IMAGE_CONFIDENCE_BONUS: u8 = 15;
pub const MEASUREMENT_CONFIDENCE_BONUS: u8 = 5;
