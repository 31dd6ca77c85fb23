use civic_ids::IssueId;

/// Errors reported by the storage collaborator.
///
/// Only [`StoreError::Transient`] is retried by the intake orchestrator; every other variant is
/// surfaced to the caller on the first occurrence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("storage temporarily unavailable: {0}")]
    Transient(String),
    #[error("issue {0} not found")]
    NotFound(IssueId),
    #[error("storage rejected the operation: {0}")]
    Permanent(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transient storage failure: {0}")]
    TransientStorage(String),
    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        last: StoreError,
    },
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read severity table: {0}")]
    TableRead(std::io::Error),
    #[error("failed to parse severity table: {0}")]
    TableParse(serde_yaml::Error),
    #[error("failed to serialize severity table: {0}")]
    TableSerialize(serde_yaml::Error),
}

impl IntakeError {
    /// True when the caller may resubmit the same report later and expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IntakeError::TransientStorage(_) | IntakeError::RetriesExhausted { .. }
        )
    }
}

impl From<StoreError> for IntakeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transient(msg) => IntakeError::TransientStorage(msg),
            StoreError::NotFound(id) => IntakeError::NotFound(format!("issue {id}")),
            StoreError::Permanent(msg) => IntakeError::Storage(msg),
        }
    }
}

impl From<civic_types::TypesError> for IntakeError {
    fn from(err: civic_types::TypesError) -> Self {
        IntakeError::InvalidArgument(err.to_string())
    }
}

impl From<civic_ids::IdError> for IntakeError {
    fn from(err: civic_ids::IdError) -> Self {
        IntakeError::InvalidArgument(err.to_string())
    }
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
