//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Binaries read environment variables and hand the raw values to the
//! `*_from_env_value(s)` helpers below; nothing in the engine reads the environment while
//! handling a report.

use crate::constants::{
    DEFAULT_PARTITION_CELL_DEGREES, DEFAULT_PARTITION_STRIPES, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY_MS, MAX_DEDUP_WINDOW_HOURS,
    SCORED_DEDUP_RADIUS_METERS, SCORED_DEDUP_WINDOW_HOURS, SIMPLE_DEDUP_RADIUS_METERS,
};
use crate::severity::SeverityTable;
use crate::{IntakeError, IntakeResult};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Which reports count as duplicates of an existing issue.
///
/// The radius boundary is inclusive: a candidate exactly `radius_meters` away matches.
#[derive(Clone, Debug, PartialEq)]
pub struct DedupPolicy {
    radius_meters: f64,
    recency_window: Option<Duration>,
}

impl DedupPolicy {
    /// Create a policy.
    ///
    /// `recency_window = None` means any open issue qualifies regardless of age.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Config` if the radius is not a positive finite number or the window
    /// is negative or longer than `MAX_DEDUP_WINDOW_HOURS`.
    pub fn new(radius_meters: f64, recency_window: Option<Duration>) -> IntakeResult<Self> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(IntakeError::Config(format!(
                "dedup radius must be a positive number of meters, got {radius_meters}"
            )));
        }
        if let Some(window) = recency_window {
            if window < Duration::zero() {
                return Err(IntakeError::Config(
                    "dedup recency window cannot be negative".into(),
                ));
            }
            if window > Duration::hours(MAX_DEDUP_WINDOW_HOURS) {
                return Err(IntakeError::Config(format!(
                    "dedup recency window cannot exceed {MAX_DEDUP_WINDOW_HOURS} hours"
                )));
            }
        }
        Ok(Self {
            radius_meters,
            recency_window,
        })
    }

    /// The stricter policy used by the AI-scored intake path: 20 m within the last 24 h.
    pub fn scored() -> Self {
        Self {
            radius_meters: SCORED_DEDUP_RADIUS_METERS,
            recency_window: Some(Duration::hours(SCORED_DEDUP_WINDOW_HOURS)),
        }
    }

    /// The looser policy used by the simple intake path: 100 m, any age.
    pub fn simple() -> Self {
        Self {
            radius_meters: SIMPLE_DEDUP_RADIUS_METERS,
            recency_window: None,
        }
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    pub fn recency_window(&self) -> Option<Duration> {
        self.recency_window
    }

    /// Inclusive radius check.
    pub fn within_radius(&self, distance_meters: f64) -> bool {
        distance_meters <= self.radius_meters
    }

    /// Oldest creation time still eligible to absorb a report arriving at `now`.
    ///
    /// `None` means no lower bound, including when the window reaches past the earliest
    /// representable time.
    pub fn eligible_since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.recency_window.and_then(|window| now.checked_sub_signed(window))
    }
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self::scored()
    }
}

/// Bounded exponential backoff for transient storage failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: std::time::Duration,
    max_delay: std::time::Duration,
}

impl RetryPolicy {
    /// # Errors
    ///
    /// Returns `IntakeError::Config` if `max_attempts` is zero or `base_delay > max_delay`.
    pub fn new(
        max_attempts: u32,
        base_delay: std::time::Duration,
        max_delay: std::time::Duration,
    ) -> IntakeResult<Self> {
        if max_attempts == 0 {
            return Err(IntakeError::Config(
                "retry policy needs at least one attempt".into(),
            ));
        }
        if base_delay > max_delay {
            return Err(IntakeError::Config(
                "retry base delay cannot exceed the maximum delay".into(),
            ));
        }
        Ok(Self {
            max_attempts,
            base_delay,
            max_delay,
        })
    }

    /// A policy that never sleeps. Useful for tests and offline replays.
    pub fn immediate(max_attempts: u32) -> IntakeResult<Self> {
        Self::new(
            max_attempts,
            std::time::Duration::ZERO,
            std::time::Duration::ZERO,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> std::time::Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            base_delay: std::time::Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            max_delay: std::time::Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    dedup: DedupPolicy,
    retry: RetryPolicy,
    partition_cell_degrees: f64,
    partition_stripes: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Config` if the partition cell size is not a positive finite number
    /// of degrees no larger than 1, or the stripe count is zero.
    pub fn new(
        dedup: DedupPolicy,
        retry: RetryPolicy,
        partition_cell_degrees: f64,
        partition_stripes: usize,
    ) -> IntakeResult<Self> {
        if !partition_cell_degrees.is_finite()
            || partition_cell_degrees <= 0.0
            || partition_cell_degrees > 1.0
        {
            return Err(IntakeError::Config(format!(
                "partition cell size must be within (0, 1] degrees, got {partition_cell_degrees}"
            )));
        }
        if partition_stripes == 0 {
            return Err(IntakeError::Config(
                "partition stripe count cannot be zero".into(),
            ));
        }

        Ok(Self {
            dedup,
            retry,
            partition_cell_degrees,
            partition_stripes,
        })
    }

    pub fn dedup(&self) -> &DedupPolicy {
        &self.dedup
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn partition_cell_degrees(&self) -> f64 {
        self.partition_cell_degrees
    }

    pub fn partition_stripes(&self) -> usize {
        self.partition_stripes
    }

    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            dedup: DedupPolicy::default(),
            retry: RetryPolicy::default(),
            partition_cell_degrees: DEFAULT_PARTITION_CELL_DEGREES,
            partition_stripes: DEFAULT_PARTITION_STRIPES,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build a dedup policy from optional raw values.
///
/// `policy` selects the named base (`scored` or `simple`, default `scored`); `radius_meters` and
/// `window_hours` override its fields. A window of `0` hours disables the recency filter.
///
/// # Errors
///
/// Returns `IntakeError::Config` for an unknown policy name or an unparsable number.
pub fn dedup_policy_from_env_values(
    policy: Option<String>,
    radius_meters: Option<String>,
    window_hours: Option<String>,
) -> IntakeResult<DedupPolicy> {
    let base = match non_blank(policy).as_deref() {
        None | Some("scored") => DedupPolicy::scored(),
        Some("simple") => DedupPolicy::simple(),
        Some(other) => {
            return Err(IntakeError::Config(format!(
                "unknown dedup policy '{other}' (expected 'scored' or 'simple')"
            )))
        }
    };

    let radius = match non_blank(radius_meters) {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|e| IntakeError::Config(format!("invalid dedup radius '{raw}': {e}")))?,
        None => base.radius_meters(),
    };

    let window = match non_blank(window_hours) {
        Some(raw) => {
            let hours = raw.parse::<i64>().map_err(|e| {
                IntakeError::Config(format!("invalid dedup window hours '{raw}': {e}"))
            })?;
            if hours == 0 {
                None
            } else {
                Some(Duration::try_hours(hours).ok_or_else(|| {
                    IntakeError::Config(format!("dedup window of {hours} hours is out of range"))
                })?)
            }
        }
        None => base.recency_window(),
    };

    DedupPolicy::new(radius, window)
}

/// Build a retry policy from an optional attempt count, keeping the default delays.
///
/// # Errors
///
/// Returns `IntakeError::Config` if the value is not a positive integer.
pub fn retry_policy_from_env_value(max_attempts: Option<String>) -> IntakeResult<RetryPolicy> {
    let defaults = RetryPolicy::default();
    match non_blank(max_attempts) {
        None => Ok(defaults),
        Some(raw) => {
            let attempts = raw.parse::<u32>().map_err(|e| {
                IntakeError::Config(format!("invalid retry attempt count '{raw}': {e}"))
            })?;
            RetryPolicy::new(attempts, defaults.base_delay, defaults.max_delay)
        }
    }
}

/// Load the severity decision table from an optional file path, falling back to the built-in
/// table when no path is given.
///
/// # Errors
///
/// Returns `IntakeError::TableRead`/`TableParse`/`InvalidArgument` if the file cannot be read,
/// parsed or validated.
pub fn severity_table_from_env_value(path: Option<String>) -> IntakeResult<SeverityTable> {
    match non_blank(path) {
        None => Ok(SeverityTable::builtin()),
        Some(path) => SeverityTable::from_yaml_file(Path::new(&path)),
    }
}
