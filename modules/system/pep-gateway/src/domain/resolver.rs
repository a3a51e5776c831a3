//! Resource type → resource id resolution.

use std::sync::Arc;

use rbac_pdp_sdk::{PolicyRepository, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No resource, or more than one, is registered for the type in the tenant.
    #[error("no unique resource for type `{0}`")]
    NotFound(String),

    #[error(transparent)]
    Unavailable(#[from] RepositoryError),
}

/// Tenant-scoped resolver over the policy store.
#[derive(Clone)]
pub struct ResourceResolver {
    repo: Arc<dyn PolicyRepository>,
    tenant_id: String,
}

impl ResourceResolver {
    #[must_use]
    pub fn new(repo: Arc<dyn PolicyRepository>, tenant_id: impl Into<String>) -> Self {
        Self {
            repo,
            tenant_id: tenant_id.into(),
        }
    }

    /// Resolve `resource_type` to exactly one resource id.
    ///
    /// Duplicate registrations are a configuration error: they are logged
    /// and reported as [`ResolveError::NotFound`].
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] when zero or several ids match
    /// - [`ResolveError::Unavailable`] when the store cannot be queried
    pub async fn resolve(&self, resource_type: &str) -> Result<String, ResolveError> {
        let mut ids = self
            .repo
            .resource_ids(resource_type, &self.tenant_id)
            .await?;

        match ids.len() {
            1 => Ok(ids.remove(0)),
            0 => {
                tracing::info!(
                    resource_type,
                    tenant_id = %self.tenant_id,
                    "resource type not registered"
                );
                Err(ResolveError::NotFound(resource_type.to_owned()))
            }
            _ => {
                tracing::error!(
                    resource_type,
                    tenant_id = %self.tenant_id,
                    ids = ?ids,
                    "resource type registered more than once"
                );
                Err(ResolveError::NotFound(resource_type.to_owned()))
            }
        }
    }
}
