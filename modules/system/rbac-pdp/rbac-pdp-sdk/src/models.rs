//! Wire and domain models for RBAC evaluation.

use serde::{Deserialize, Serialize};

use crate::data::CollectionData;

/// The only action the gateway pipeline evaluates.
pub const ACTION_VIEW: &str = "view";

/// Message returned with every granting decision.
pub const MESSAGE_GRANTED: &str = "Access granted";

/// Message returned with every denying decision.
pub const MESSAGE_DENIED: &str = "Access denied";

/// Authorization evaluation request.
///
/// `data` is present only in phase-2 (redaction) calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Opaque subject identifier taken from the inbound request.
    pub user_id: String,
    /// Resource type name (first path segment, e.g. `"employees"`).
    pub resource_type: String,
    /// Resolved (or explicitly requested) resource identifier.
    pub resource_id: String,
    /// Action name (e.g. `"view"`).
    pub action: String,
    /// Captured backend payload to redact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CollectionData>,
}

impl EvaluationRequest {
    /// Build a phase-1 request (no payload).
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            action: action.into(),
            data: None,
        }
    }

    /// Attach a payload, turning this into a phase-2 request.
    #[must_use]
    pub fn with_data(mut self, data: CollectionData) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether this is a redaction (phase-2) request.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Authorization decision.
///
/// Invariants: `allowed_fields` is empty when `allow` is false, and
/// `filtered_data` is only set on a granting phase-2 decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResponse {
    pub allow: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_data: Option<CollectionData>,
}

impl PolicyResponse {
    /// A denying decision.
    #[must_use]
    pub fn denied() -> Self {
        Self {
            allow: false,
            message: MESSAGE_DENIED.to_owned(),
            allowed_fields: Vec::new(),
            filtered_data: None,
        }
    }

    /// A granting decision exposing `allowed_fields`.
    #[must_use]
    pub fn granted(allowed_fields: Vec<String>) -> Self {
        Self {
            allow: true,
            message: MESSAGE_GRANTED.to_owned(),
            allowed_fields,
            filtered_data: None,
        }
    }

    /// Attach the redacted payload.
    #[must_use]
    pub fn with_filtered_data(mut self, data: CollectionData) -> Self {
        self.filtered_data = Some(data);
        self
    }
}

/// A role assignable to subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Permission triple: `role` may perform `action` on `resource_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub role: String,
    pub resource_id: String,
    pub action: String,
}

impl Permission {
    #[must_use]
    pub fn new(
        role: impl Into<String>,
        resource_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            resource_id: resource_id.into(),
            action: action.into(),
        }
    }

    /// Whether this permission grants `action` on `resource_id`.
    #[must_use]
    pub fn grants(&self, resource_id: &str, action: &str) -> bool {
        self.resource_id == resource_id && self.action == action
    }
}

/// A subject's roles and the permissions attached to those roles.
///
/// Rebuilt from the repository on every evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectGrants {
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl SubjectGrants {
    #[must_use]
    pub fn new(roles: Vec<Role>, permissions: Vec<Permission>) -> Self {
        Self { roles, permissions }
    }

    /// Role identifiers held by the subject.
    pub fn role_ids(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.id.as_str())
    }
}

/// A concrete resource targeted by an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub id: String,
    pub resource_type: String,
}

impl ResourceRef {
    #[must_use]
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
        }
    }
}
