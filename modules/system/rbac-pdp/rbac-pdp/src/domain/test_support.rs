#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Shared fixtures for PDP unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rbac_pdp_sdk::{
    ACTION_VIEW, Permission, PolicyRepository, RepositoryError, Role, SubjectGrants,
};

use super::engine::DecisionEngine;
use super::visibility::VisibilityTable;
use crate::config::{FieldAccess, RoleVisibilityConfig, VisibilityPolicyConfig};

pub const MANAGER: &str = "11111111-1111-1111-1111-111111111111";
pub const EMPLOYEE: &str = "22222222-2222-2222-2222-222222222222";
pub const RESOURCE_ID: &str = "33333333-3333-3333-3333-333333333333";

#[must_use]
pub fn employees_engine() -> DecisionEngine {
    let schema = [
        "id",
        "name",
        "email",
        "phone",
        "department_name",
        "position",
        "salary",
        "hire_date",
        "employment_type",
    ];
    let table = VisibilityTable::from_config(&[VisibilityPolicyConfig {
        resource_type: "employees".to_owned(),
        schema: schema.iter().map(|s| (*s).to_owned()).collect(),
        roles: vec![
            RoleVisibilityConfig {
                role_id: MANAGER.to_owned(),
                fields: FieldAccess::Full,
            },
            RoleVisibilityConfig {
                role_id: EMPLOYEE.to_owned(),
                fields: FieldAccess::Fields(
                    ["id", "name", "department_name", "employment_type"]
                        .iter()
                        .map(|s| (*s).to_owned())
                        .collect(),
                ),
            },
        ],
    }])
    .unwrap();
    DecisionEngine::new(Arc::new(table))
}

/// In-memory repository: every role gets `view` on [`RESOURCE_ID`].
#[derive(Default)]
pub struct FakeRepository {
    users: HashMap<String, Vec<String>>,
    extra: Vec<Permission>,
    failure: Option<RepositoryError>,
}

impl FakeRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing(err: RepositoryError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: &str, roles: &[&str]) -> Self {
        self.users.insert(
            user.to_owned(),
            roles.iter().map(|r| (*r).to_owned()).collect(),
        );
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.extra.push(permission);
        self
    }
}

#[async_trait]
impl PolicyRepository for FakeRepository {
    async fn roles_and_permissions(
        &self,
        subject_id: &str,
    ) -> Result<SubjectGrants, RepositoryError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let Some(role_ids) = self.users.get(subject_id) else {
            return Ok(SubjectGrants::default());
        };

        let roles = role_ids
            .iter()
            .map(|id| Role {
                id: id.clone(),
                name: id.clone(),
                description: String::new(),
            })
            .collect();
        let mut permissions: Vec<Permission> = role_ids
            .iter()
            .map(|id| Permission::new(id.clone(), RESOURCE_ID, ACTION_VIEW))
            .collect();
        permissions.extend(self.extra.iter().cloned());
        Ok(SubjectGrants::new(roles, permissions))
    }

    async fn resource_ids(
        &self,
        _resource_type: &str,
        _tenant_id: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        Ok(vec![RESOURCE_ID.to_owned()])
    }
}
