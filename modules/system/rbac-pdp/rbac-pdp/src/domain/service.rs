//! PDP service: load grants, validate, decide.

use std::sync::Arc;

use rbac_pdp_sdk::{EvaluationRequest, PolicyRepository, PolicyResponse, ResourceRef, SubjectGrants};

use super::engine::DecisionEngine;
use super::error::DomainError;

/// RBAC decision point.
///
/// Grants are read from the repository on every call; nothing is cached.
pub struct Service {
    repo: Arc<dyn PolicyRepository>,
    engine: DecisionEngine,
}

impl Service {
    #[must_use]
    pub fn new(repo: Arc<dyn PolicyRepository>, engine: DecisionEngine) -> Self {
        Self { repo, engine }
    }

    /// Evaluate a phase-1 or phase-2 request.
    ///
    /// # Errors
    ///
    /// - [`DomainError::InvalidRequest`] if a required field is empty
    /// - [`DomainError::Repository`] if grants cannot be loaded
    /// - [`DomainError::InvalidGrants`] if the store returned malformed grants
    /// - [`DomainError::Engine`] if the visibility table does not cover the type
    #[tracing::instrument(
        skip(self, request),
        fields(
            user_id = %request.user_id,
            resource_type = %request.resource_type,
            resource_id = %request.resource_id,
            action = %request.action,
            phase = if request.has_data() { 2 } else { 1 },
        )
    )]
    pub async fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> Result<PolicyResponse, DomainError> {
        validate_request(&request)?;

        let grants = self.repo.roles_and_permissions(&request.user_id).await?;
        validate_grants(&request.user_id, &grants)?;

        let resource = ResourceRef::new(request.resource_id, request.resource_type);
        let decision =
            self.engine
                .decide(&grants, &resource, &request.action, request.data.as_ref())?;

        tracing::info!(
            allow = decision.allow,
            roles = grants.roles.len(),
            allowed_fields = decision.allowed_fields.len(),
            "decision made"
        );
        if let Some(filtered) = &decision.filtered_data {
            tracing::debug!(records = filtered.record_count(), "payload redacted");
        }
        Ok(decision)
    }
}

fn validate_request(request: &EvaluationRequest) -> Result<(), DomainError> {
    let required = [
        ("user_id", &request.user_id),
        ("resource_type", &request.resource_type),
        ("resource_id", &request.resource_id),
        ("action", &request.action),
    ];
    match required.iter().find(|(_, value)| value.is_empty()) {
        Some((name, _)) => Err(DomainError::InvalidRequest(format!("{name} is empty"))),
        None => Ok(()),
    }
}

fn validate_grants(subject: &str, grants: &SubjectGrants) -> Result<(), DomainError> {
    let invalid = |reason: &str| DomainError::InvalidGrants {
        subject: subject.to_owned(),
        reason: reason.to_owned(),
    };

    if grants.roles.iter().any(|r| r.id.is_empty()) {
        return Err(invalid("role with empty id"));
    }
    for p in &grants.permissions {
        if p.role.is_empty() || p.resource_id.is_empty() {
            return Err(invalid("permission with empty role or resource id"));
        }
        if p.action.is_empty() {
            return Err(invalid("permission with empty action"));
        }
    }
    Ok(())
}
