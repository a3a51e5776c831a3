//! Public API trait for the RBAC decision point.

use async_trait::async_trait;

use crate::error::EvaluationError;
use crate::models::{EvaluationRequest, PolicyResponse};

/// Evaluation API consumed by the gateway acting as PEP.
///
/// Implemented in-process by the PDP local client and over HTTP by the
/// gateway's remote client:
///
/// ```ignore
/// let decision = client.evaluate(request).await?;
/// ```
#[async_trait]
pub trait AccessEvaluationClient: Send + Sync {
    /// Evaluate an access request.
    ///
    /// A policy denial is a successful evaluation with `allow == false`.
    ///
    /// # Errors
    ///
    /// - `Transport` / `Timeout` if the decision service cannot be reached
    /// - `UnexpectedStatus` / `Decode` if the reply is not a valid decision
    /// - `InvalidRequest` if the request violates the evaluation contract
    /// - `Internal` if the decision service failed to evaluate
    async fn evaluate(&self, request: EvaluationRequest) -> Result<PolicyResponse, EvaluationError>;
}
