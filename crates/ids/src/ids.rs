//! Identifier newtypes and their canonical-form parsing.

use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Returns true if `input` is in canonical UUID form.
///
/// This is a purely syntactic check: exactly 32 bytes, lowercase hex only.
fn is_canonical(input: &str) -> bool {
    input.len() == 32
        && input
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn parse_canonical(kind: &str, input: &str) -> IdResult<Uuid> {
    if !is_canonical(input) {
        return Err(IdError::InvalidInput(format!(
            "{kind} must be 32 lowercase hex characters without hyphens, got: '{input}'"
        )));
    }
    Uuid::parse_str(input)
        .map_err(|e| IdError::InvalidInput(format!("{kind} is not a valid UUID: {e}")))
}

/// Identity of a persisted issue.
///
/// Issued by the storage collaborator when a new issue is created. Displays in canonical form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssueId(Uuid);

impl IssueId {
    /// Allocates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> IdResult<Self> {
        parse_canonical("issue id", input).map(Self)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` would be accepted by [`IssueId::parse`].
    pub fn is_canonical(input: &str) -> bool {
        is_canonical(input)
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for IssueId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueId::parse(s)
    }
}

/// Identity of one citizen report.
///
/// Every intake request carries one, either supplied by the client (so a resubmission after a
/// network failure is recognised) or generated on arrival. The store uses it to make issue
/// creation and corroboration increments idempotent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a client-supplied report identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> IdResult<Self> {
        parse_canonical("report id", input).map(Self)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ReportId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportId::parse(s)
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{IssueId, ReportId};

    impl serde::Serialize for IssueId {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> serde::Deserialize<'de> for IssueId {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            IssueId::parse(&s).map_err(serde::de::Error::custom)
        }
    }

    impl serde::Serialize for ReportId {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> serde::Deserialize<'de> for ReportId {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            ReportId::parse(&s).map_err(serde::de::Error::custom)
        }
    }
}
