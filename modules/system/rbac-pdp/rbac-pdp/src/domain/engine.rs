//! RBAC decision engine.
//!
//! Pure function of its inputs plus the immutable [`VisibilityTable`]; safe to
//! share across tasks.

use std::sync::Arc;

use rbac_pdp_sdk::{CollectionData, PolicyResponse, ResourceRef, SubjectGrants};

use super::redact::redact;
use super::visibility::VisibilityTable;

/// Decision failure caused by inconsistent configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("no visibility policy configured for resource type `{0}`")]
    UnconfiguredResourceType(String),
}

/// Permission matching and field-visibility computation.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    table: Arc<VisibilityTable>,
}

impl DecisionEngine {
    #[must_use]
    pub fn new(table: Arc<VisibilityTable>) -> Self {
        Self { table }
    }

    /// Decide whether `grants` allow `action` on `resource` and, when `data`
    /// is supplied, produce its redacted copy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnconfiguredResourceType`] when access would be
    /// granted on a resource type the visibility table does not cover.
    pub fn decide(
        &self,
        grants: &SubjectGrants,
        resource: &ResourceRef,
        action: &str,
        data: Option<&CollectionData>,
    ) -> Result<PolicyResponse, EngineError> {
        let contributing = contributing_roles(grants, resource, action);
        if contributing.is_empty() {
            return Ok(PolicyResponse::denied());
        }

        let allowed_fields = self
            .table
            .visible_fields(&resource.resource_type, contributing.iter().copied())
            .ok_or_else(|| EngineError::UnconfiguredResourceType(resource.resource_type.clone()))?;

        let response = match data {
            Some(data) => {
                let filtered = redact(data, &allowed_fields);
                PolicyResponse::granted(allowed_fields).with_filtered_data(filtered)
            }
            None => PolicyResponse::granted(allowed_fields),
        };
        Ok(response)
    }
}

/// Roles held by the subject that carry a permission for `(resource, action)`,
/// in role order, without duplicates.
fn contributing_roles<'a>(
    grants: &'a SubjectGrants,
    resource: &ResourceRef,
    action: &str,
) -> Vec<&'a str> {
    grants
        .roles
        .iter()
        .map(|role| role.id.as_str())
        .filter(|role_id| {
            grants
                .permissions
                .iter()
                .any(|p| p.role == *role_id && p.grants(&resource.id, action))
        })
        .fold(Vec::new(), |mut acc, role_id| {
            if !acc.contains(&role_id) {
                acc.push(role_id);
            }
            acc
        })
}
