//! Repository contract for roles, permissions and resources.

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::models::SubjectGrants;

/// Read-only policy store shared by the PEP (resource lookup) and the PDP
/// (role and permission lookup).
///
/// Implementations must be safe for concurrent use; pooled connections are
/// acquired per call.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Roles assigned to `subject_id` and the permissions attached to them.
    ///
    /// An unknown subject yields empty grants, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store cannot be queried.
    async fn roles_and_permissions(&self, subject_id: &str)
    -> Result<SubjectGrants, RepositoryError>;

    /// Identifiers of every resource named `resource_type` in `tenant_id`,
    /// in ascending identifier order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store cannot be queried.
    async fn resource_ids(
        &self,
        resource_type: &str,
        tenant_id: &str,
    ) -> Result<Vec<String>, RepositoryError>;

    /// Release pooled resources. Called once at shutdown.
    async fn close(&self) {}
}
