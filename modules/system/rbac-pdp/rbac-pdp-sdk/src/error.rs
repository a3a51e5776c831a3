//! Error types shared across the PEP/PDP boundary.

/// Failure to obtain a decision.
///
/// Never equivalent to a deny: callers map it to an internal error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("decision service unreachable: {0}")]
    Transport(String),

    #[error("decision service timed out")]
    Timeout,

    #[error("decision service returned HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("malformed decision response: {0}")]
    Decode(String),

    #[error("invalid evaluation request: {0}")]
    InvalidRequest(String),

    #[error("evaluation failed: {0}")]
    Internal(String),
}

/// Failure of the role/permission/resource store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("policy store unavailable: {0}")]
    Unavailable(String),

    #[error("policy store returned an invalid row: {0}")]
    InvalidRow(String),
}
