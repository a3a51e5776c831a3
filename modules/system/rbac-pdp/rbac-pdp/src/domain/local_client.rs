//! Local (in-process) client for the RBAC PDP.

use std::sync::Arc;

use async_trait::async_trait;
use rbac_pdp_sdk::{AccessEvaluationClient, EvaluationError, EvaluationRequest, PolicyResponse};

use super::{DomainError, Service};

/// Local client wrapping the PDP service.
pub struct RbacPdpLocalClient {
    svc: Arc<Service>,
}

impl RbacPdpLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> EvaluationError {
    tracing::error!(operation = op, error = ?e, "rbac_pdp call failed");
    e.into()
}

#[async_trait]
impl AccessEvaluationClient for RbacPdpLocalClient {
    async fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> Result<PolicyResponse, EvaluationError> {
        self.svc
            .evaluate(request)
            .await
            .map_err(|e| log_and_convert("evaluate", e))
    }
}
