//! Configuration-backed repository for development and tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rbac_pdp_sdk::{Permission, PolicyRepository, RepositoryError, Role, SubjectGrants};

use crate::config::{ResourceRecord, StaticStoreConfig};

/// Broken references inside a static store declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StaticStoreError {
    #[error("role with an empty id")]
    EmptyRoleId,

    #[error("role `{0}` declared twice")]
    DuplicateRole(String),

    #[error("resource with an empty id or type")]
    EmptyResource,

    #[error("resource `{0}` declared twice")]
    DuplicateResource(String),

    #[error("assignment for an empty user id")]
    EmptyUserId,

    #[error("user `{user_id}` is assigned unknown role `{role_id}`")]
    UnknownAssignedRole { user_id: String, role_id: String },

    #[error("permission references unknown role `{0}`")]
    UnknownPermissionRole(String),

    #[error("permission references unknown resource `{0}`")]
    UnknownPermissionResource(String),

    #[error("permission for role `{0}` has an empty action")]
    EmptyAction(String),
}

/// In-memory [`PolicyRepository`].
///
/// Several resources may share a `(resource_type, tenant_id)` pair; the
/// resolver treats that as a configuration error at lookup time.
#[derive(Debug, Clone)]
pub struct StaticPolicyRepository {
    roles: HashMap<String, Role>,
    assignments: HashMap<String, Vec<String>>,
    permissions: Vec<Permission>,
    resources: Vec<ResourceRecord>,
}

impl StaticPolicyRepository {
    /// Validate and index a static store declaration.
    ///
    /// # Errors
    ///
    /// Returns [`StaticStoreError`] on empty or duplicated identifiers and
    /// on references to undeclared roles or resources.
    pub fn from_config(cfg: &StaticStoreConfig) -> Result<Self, StaticStoreError> {
        let mut roles = HashMap::with_capacity(cfg.roles.len());
        for role in &cfg.roles {
            if role.id.is_empty() {
                return Err(StaticStoreError::EmptyRoleId);
            }
            if roles.insert(role.id.clone(), role.clone()).is_some() {
                return Err(StaticStoreError::DuplicateRole(role.id.clone()));
            }
        }

        let mut resource_ids = HashSet::with_capacity(cfg.resources.len());
        for res in &cfg.resources {
            if res.id.is_empty() || res.resource_type.is_empty() {
                return Err(StaticStoreError::EmptyResource);
            }
            if !resource_ids.insert(res.id.as_str()) {
                return Err(StaticStoreError::DuplicateResource(res.id.clone()));
            }
        }

        let mut assignments: HashMap<String, Vec<String>> = HashMap::new();
        for a in &cfg.assignments {
            if a.user_id.is_empty() {
                return Err(StaticStoreError::EmptyUserId);
            }
            let held = assignments.entry(a.user_id.clone()).or_default();
            for role_id in &a.role_ids {
                if !roles.contains_key(role_id) {
                    return Err(StaticStoreError::UnknownAssignedRole {
                        user_id: a.user_id.clone(),
                        role_id: role_id.clone(),
                    });
                }
                if !held.contains(role_id) {
                    held.push(role_id.clone());
                }
            }
        }

        for p in &cfg.permissions {
            if !roles.contains_key(&p.role) {
                return Err(StaticStoreError::UnknownPermissionRole(p.role.clone()));
            }
            if !resource_ids.contains(p.resource_id.as_str()) {
                return Err(StaticStoreError::UnknownPermissionResource(
                    p.resource_id.clone(),
                ));
            }
            if p.action.is_empty() {
                return Err(StaticStoreError::EmptyAction(p.role.clone()));
            }
        }

        Ok(Self {
            roles,
            assignments,
            permissions: cfg.permissions.clone(),
            resources: cfg.resources.clone(),
        })
    }
}

#[async_trait]
impl PolicyRepository for StaticPolicyRepository {
    async fn roles_and_permissions(
        &self,
        subject_id: &str,
    ) -> Result<SubjectGrants, RepositoryError> {
        let Some(role_ids) = self.assignments.get(subject_id) else {
            return Ok(SubjectGrants::default());
        };

        let roles = role_ids
            .iter()
            .filter_map(|id| self.roles.get(id).cloned())
            .collect();
        let permissions = self
            .permissions
            .iter()
            .filter(|p| role_ids.contains(&p.role))
            .cloned()
            .collect();
        Ok(SubjectGrants::new(roles, permissions))
    }

    async fn resource_ids(
        &self,
        resource_type: &str,
        tenant_id: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut ids: Vec<String> = self
            .resources
            .iter()
            .filter(|r| r.resource_type == resource_type && r.tenant_id == tenant_id)
            .map(|r| r.id.clone())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::RoleAssignment;

    const TENANT: &str = "11111111-1111-1111-1111-111111111111";

    fn role(id: &str) -> Role {
        Role {
            id: id.to_owned(),
            name: format!("role {id}"),
            description: String::new(),
        }
    }

    fn resource(id: &str, resource_type: &str, tenant_id: &str) -> ResourceRecord {
        ResourceRecord {
            id: id.to_owned(),
            resource_type: resource_type.to_owned(),
            tenant_id: tenant_id.to_owned(),
        }
    }

    fn base_config() -> StaticStoreConfig {
        StaticStoreConfig {
            roles: vec![role("manager"), role("employee")],
            assignments: vec![
                RoleAssignment {
                    user_id: "alice".to_owned(),
                    role_ids: vec!["manager".to_owned(), "employee".to_owned()],
                },
                RoleAssignment {
                    user_id: "bob".to_owned(),
                    role_ids: vec!["employee".to_owned()],
                },
            ],
            permissions: vec![
                Permission::new("manager", "res-emp", "view"),
                Permission::new("employee", "res-emp", "view"),
                Permission::new("manager", "res-dept", "view"),
            ],
            resources: vec![
                resource("res-emp", "employees", TENANT),
                resource("res-dept", "departments", TENANT),
            ],
        }
    }

    #[tokio::test]
    async fn returns_roles_and_their_permissions() {
        let repo = StaticPolicyRepository::from_config(&base_config()).unwrap();

        let grants = repo.roles_and_permissions("bob").await.unwrap();

        assert_eq!(grants.role_ids().collect::<Vec<_>>(), vec!["employee"]);
        assert_eq!(
            grants.permissions,
            vec![Permission::new("employee", "res-emp", "view")]
        );
    }

    #[tokio::test]
    async fn unknown_subject_has_no_grants() {
        let repo = StaticPolicyRepository::from_config(&base_config()).unwrap();

        let grants = repo.roles_and_permissions("mallory").await.unwrap();

        assert_eq!(grants, SubjectGrants::default());
    }

    #[tokio::test]
    async fn resource_ids_are_tenant_scoped_and_sorted() {
        let mut cfg = base_config();
        cfg.resources.push(resource("res-b", "projects", TENANT));
        cfg.resources.push(resource("res-a", "projects", TENANT));
        cfg.resources.push(resource("res-c", "projects", "other-tenant"));
        let repo = StaticPolicyRepository::from_config(&cfg).unwrap();

        assert_eq!(
            repo.resource_ids("projects", TENANT).await.unwrap(),
            vec!["res-a", "res-b"]
        );
        assert_eq!(repo.resource_ids("employees", TENANT).await.unwrap(), vec!["res-emp"]);
        assert!(repo.resource_ids("invoices", TENANT).await.unwrap().is_empty());
    }

    #[test]
    fn rejects_dangling_references() {
        let mut cfg = base_config();
        cfg.permissions.push(Permission::new("ghost", "res-emp", "view"));
        assert_eq!(
            StaticPolicyRepository::from_config(&cfg).unwrap_err(),
            StaticStoreError::UnknownPermissionRole("ghost".to_owned())
        );

        let mut cfg = base_config();
        cfg.permissions.push(Permission::new("manager", "res-missing", "view"));
        assert!(matches!(
            StaticPolicyRepository::from_config(&cfg),
            Err(StaticStoreError::UnknownPermissionResource(_))
        ));

        let mut cfg = base_config();
        cfg.assignments[0].role_ids.push("ghost".to_owned());
        assert!(matches!(
            StaticPolicyRepository::from_config(&cfg),
            Err(StaticStoreError::UnknownAssignedRole { .. })
        ));
    }

    #[test]
    fn rejects_duplicates_and_empty_ids() {
        let mut cfg = base_config();
        cfg.roles.push(role("manager"));
        assert!(matches!(
            StaticPolicyRepository::from_config(&cfg),
            Err(StaticStoreError::DuplicateRole(_))
        ));

        let mut cfg = base_config();
        cfg.resources.push(resource("res-emp", "employees", TENANT));
        assert!(matches!(
            StaticPolicyRepository::from_config(&cfg),
            Err(StaticStoreError::DuplicateResource(_))
        ));

        let mut cfg = base_config();
        cfg.permissions.push(Permission::new("manager", "res-emp", ""));
        assert!(matches!(
            StaticPolicyRepository::from_config(&cfg),
            Err(StaticStoreError::EmptyAction(_))
        ));
    }
}
