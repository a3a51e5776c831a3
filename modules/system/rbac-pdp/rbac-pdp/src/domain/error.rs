//! PDP domain errors.

use rbac_pdp_sdk::{EvaluationError, RepositoryError};

use super::engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// The evaluation request itself is malformed.
    #[error("invalid evaluation request: {0}")]
    InvalidRequest(String),

    /// The store returned roles or permissions with empty identifiers.
    #[error("invalid grants for subject `{subject}`: {reason}")]
    InvalidGrants { subject: String, reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<DomainError> for EvaluationError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
