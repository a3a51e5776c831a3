//! Role-scoped field visibility table.
//!
//! Built once from configuration and validated up front; shared read-only by
//! every evaluation.

use std::collections::{HashMap, HashSet};

use crate::config::{FieldAccess, VisibilityPolicyConfig};

/// Invalid visibility configuration. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisibilityConfigError {
    #[error("no visibility policies configured")]
    Empty,

    #[error("visibility policy with an empty resource type")]
    EmptyResourceType,

    #[error("duplicate visibility policy for resource type `{0}`")]
    DuplicateResourceType(String),

    #[error("resource type `{0}` has an empty field schema")]
    EmptySchema(String),

    #[error("resource type `{resource_type}` lists field `{field}` more than once")]
    DuplicateField {
        resource_type: String,
        field: String,
    },

    #[error("resource type `{0}` has a role entry with an empty role id")]
    EmptyRoleId(String),

    #[error("role `{role_id}` is configured twice for resource type `{resource_type}`")]
    DuplicateRole {
        resource_type: String,
        role_id: String,
    },

    #[error("role `{role_id}` on `{resource_type}` references unknown field `{field}`")]
    UnknownField {
        resource_type: String,
        role_id: String,
        field: String,
    },
}

#[derive(Debug, Clone)]
struct ResourceVisibility {
    schema: Vec<String>,
    roles: HashMap<String, HashSet<String>>,
}

impl ResourceVisibility {
    fn from_config(cfg: &VisibilityPolicyConfig) -> Result<Self, VisibilityConfigError> {
        let resource_type = cfg.resource_type.as_str();
        if cfg.schema.is_empty() {
            return Err(VisibilityConfigError::EmptySchema(resource_type.to_owned()));
        }

        let mut seen = HashSet::with_capacity(cfg.schema.len());
        for field in &cfg.schema {
            if !seen.insert(field.as_str()) {
                return Err(VisibilityConfigError::DuplicateField {
                    resource_type: resource_type.to_owned(),
                    field: field.clone(),
                });
            }
        }

        let mut roles = HashMap::with_capacity(cfg.roles.len());
        for role in &cfg.roles {
            if role.role_id.is_empty() {
                return Err(VisibilityConfigError::EmptyRoleId(resource_type.to_owned()));
            }
            let fields: HashSet<String> = match &role.fields {
                FieldAccess::Full => cfg.schema.iter().cloned().collect(),
                FieldAccess::Fields(fields) => {
                    if let Some(unknown) = fields.iter().find(|f| !seen.contains(f.as_str())) {
                        return Err(VisibilityConfigError::UnknownField {
                            resource_type: resource_type.to_owned(),
                            role_id: role.role_id.clone(),
                            field: unknown.clone(),
                        });
                    }
                    fields.iter().cloned().collect()
                }
            };
            if roles.insert(role.role_id.clone(), fields).is_some() {
                return Err(VisibilityConfigError::DuplicateRole {
                    resource_type: resource_type.to_owned(),
                    role_id: role.role_id.clone(),
                });
            }
        }

        Ok(Self {
            schema: cfg.schema.clone(),
            roles,
        })
    }
}

/// Validated role → visible-fields mapping, per resource type.
#[derive(Debug, Clone)]
pub struct VisibilityTable {
    resources: HashMap<String, ResourceVisibility>,
}

impl VisibilityTable {
    /// Build and validate the table.
    ///
    /// # Errors
    ///
    /// Returns [`VisibilityConfigError`] when the configuration is empty,
    /// duplicated, or references fields outside a resource's schema.
    pub fn from_config(policies: &[VisibilityPolicyConfig]) -> Result<Self, VisibilityConfigError> {
        if policies.is_empty() {
            return Err(VisibilityConfigError::Empty);
        }

        let mut resources = HashMap::with_capacity(policies.len());
        for policy in policies {
            if policy.resource_type.is_empty() {
                return Err(VisibilityConfigError::EmptyResourceType);
            }
            let visibility = ResourceVisibility::from_config(policy)?;
            if resources
                .insert(policy.resource_type.clone(), visibility)
                .is_some()
            {
                return Err(VisibilityConfigError::DuplicateResourceType(
                    policy.resource_type.clone(),
                ));
            }
        }

        Ok(Self { resources })
    }

    /// Union of the visible fields of `role_ids` on `resource_type`, in schema
    /// order. Roles without an entry contribute nothing.
    ///
    /// Returns `None` when no policy is configured for `resource_type`.
    #[must_use]
    pub fn visible_fields<'a, I>(&self, resource_type: &str, role_ids: I) -> Option<Vec<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let resource = self.resources.get(resource_type)?;
        let role_sets: Vec<&HashSet<String>> = role_ids
            .into_iter()
            .filter_map(|id| resource.roles.get(id))
            .collect();

        Some(
            resource
                .schema
                .iter()
                .filter(|field| role_sets.iter().any(|set| set.contains(field.as_str())))
                .cloned()
                .collect(),
        )
    }
}
