//! Enforcement failures and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rbac_pdp_sdk::{EvaluationError, MESSAGE_DENIED};

use super::resolver::ResolveError;
use crate::infra::backend::BackendError;

/// Which decision round was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Authorization, before the backend is called.
    Authorize,
    /// Redaction of the captured backend response.
    Redact,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authorize => f.write_str("phase-1"),
            Self::Redact => f.write_str("phase-2"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnforcementError {
    #[error("missing X-User-ID header")]
    MissingUserId,

    #[error("method not supported")]
    MethodNotAllowed,

    #[error("request path has no resource type")]
    InvalidPath,

    #[error("request body too large")]
    BodyTooLarge,

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("resource resolution failed: {0}")]
    Unresolved(#[from] ResolveError),

    #[error("access denied in {0}")]
    Denied(Phase),

    #[error("{phase} evaluation failed: {source}")]
    Evaluation {
        phase: Phase,
        #[source]
        source: EvaluationError,
    },

    #[error("no backend configured for `{0}`")]
    NoBackend(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("granting phase-2 decision carried no filtered data")]
    MissingFilteredData,

    #[error("failed to encode filtered data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout,
}

impl EnforcementError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUserId | Self::InvalidPath | Self::BodyRead(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unresolved(_) | Self::Denied(_) => StatusCode::FORBIDDEN,
            Self::Evaluation { .. } | Self::MissingFilteredData | Self::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NoBackend(_)
            | Self::Backend(
                BackendError::Unreachable(_) | BackendError::ResponseTooLarge { .. },
            ) => StatusCode::BAD_GATEWAY,
            Self::Backend(BackendError::Timeout) | Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Client-facing body; internal detail stays in the logs.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingUserId => "Missing X-User-ID header",
            Self::MethodNotAllowed => "Only GET method is supported",
            Self::InvalidPath => "Invalid path",
            Self::BodyTooLarge => "Request body too large",
            Self::BodyRead(_) => "Invalid request body",
            Self::Unresolved(_) | Self::Denied(_) => MESSAGE_DENIED,
            Self::Evaluation { .. } | Self::MissingFilteredData | Self::Encode(_) => {
                "Internal server error"
            }
            Self::NoBackend(_) | Self::Backend(_) => "Bad gateway",
            Self::Timeout => "Gateway timeout",
        }
    }

    /// Emit the log line for this failure at its level.
    pub fn log(&self) {
        match self {
            Self::MissingUserId
            | Self::MethodNotAllowed
            | Self::InvalidPath
            | Self::BodyTooLarge
            | Self::BodyRead(_) => {
                tracing::info!(error = %self, "rejected malformed request");
            }
            Self::Unresolved(_) | Self::Denied(_) => {
                tracing::info!(error = %self, "access denied");
            }
            Self::Backend(BackendError::Timeout) | Self::Timeout => {
                tracing::warn!(error = %self, "request timed out");
            }
            _ => tracing::error!(error = %self, "request failed"),
        }
    }
}

impl IntoResponse for EnforcementError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (EnforcementError::MissingUserId, 400),
            (EnforcementError::MethodNotAllowed, 405),
            (EnforcementError::InvalidPath, 400),
            (EnforcementError::BodyTooLarge, 413),
            (EnforcementError::BodyRead("reset".to_owned()), 400),
            (EnforcementError::Unresolved(ResolveError::NotFound("x".to_owned())), 403),
            (EnforcementError::Denied(Phase::Authorize), 403),
            (EnforcementError::Denied(Phase::Redact), 403),
            (
                EnforcementError::Evaluation {
                    phase: Phase::Authorize,
                    source: EvaluationError::Timeout,
                },
                500,
            ),
            (EnforcementError::MissingFilteredData, 500),
            (EnforcementError::Backend(BackendError::Unreachable("x".to_owned())), 502),
            (EnforcementError::Backend(BackendError::ResponseTooLarge { limit: 1 }), 502),
            (EnforcementError::Backend(BackendError::Timeout), 504),
            (EnforcementError::Timeout, 504),
            (EnforcementError::NoBackend("employees".to_owned()), 502),
        ];

        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{err}");
        }
    }

    #[test]
    fn denial_message_hides_cause() {
        let err = EnforcementError::Unresolved(ResolveError::NotFound("employees".to_owned()));
        assert_eq!(err.public_message(), "Access denied");

        let err = EnforcementError::Evaluation {
            phase: Phase::Redact,
            source: EvaluationError::Decode("expected value".to_owned()),
        };
        assert_eq!(err.public_message(), "Internal server error");
    }
}
