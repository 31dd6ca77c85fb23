//! Bounded retries for storage calls.

use crate::config::RetryPolicy;
use crate::{IntakeError, IntakeResult, StoreError};

/// Run `op` until it succeeds, fails permanently, or the policy runs out of attempts.
///
/// Only [`StoreError::Transient`] is retried. The caller is responsible for making `op`
/// idempotent; the intake writes are keyed by report id for exactly this reason.
///
/// # Errors
///
/// Returns the mapped store error for non-transient failures, or
/// `IntakeError::RetriesExhausted` carrying the last transient error.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut op: impl FnMut() -> Result<T, StoreError>,
) -> IntakeResult<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts() => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient storage failure, retrying"
                );
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                attempt += 1;
            }
            Err(err) if err.is_transient() => {
                tracing::error!(operation, attempts = attempt, error = %err, "retries exhausted");
                return Err(IntakeError::RetriesExhausted {
                    operation,
                    attempts: attempt,
                    last: err,
                });
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_ids::IssueId;

    #[test]
    fn test_succeeds_after_transient_failures() {
        let mut calls = 0;
        let result = with_retry(&RetryPolicy::immediate(3).unwrap(), "query", || {
            calls += 1;
            if calls < 3 {
                Err(StoreError::Transient("timeout".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_exhaustion_reports_attempts_and_last_error() {
        let mut calls = 0;
        let err = with_retry::<()>(&RetryPolicy::immediate(2).unwrap(), "create", || {
            calls += 1;
            Err(StoreError::Transient(format!("timeout {calls}")))
        })
        .unwrap_err();

        assert_eq!(calls, 2);
        match err {
            IntakeError::RetriesExhausted {
                operation,
                attempts,
                last,
            } => {
                assert_eq!(operation, "create");
                assert_eq!(attempts, 2);
                assert_eq!(last, StoreError::Transient("timeout 2".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let mut calls = 0;
        let missing = IssueId::new();
        let err = with_retry::<()>(&RetryPolicy::immediate(5).unwrap(), "increment", || {
            calls += 1;
            Err(StoreError::NotFound(missing))
        })
        .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, IntakeError::NotFound(_)));
    }
}
