//! Configuration for the RBAC decision point.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// Default bound on a `POST /evaluation` body.
///
/// Phase-2 requests carry a whole buffered backend response, so this sits
/// above the gateway's default response bound (10 MiB) with room for the
/// request envelope.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

/// PDP configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RbacPdpConfig {
    /// Listen address of the REST surface.
    pub listen: String,

    /// Largest evaluation request body accepted by the REST surface.
    pub max_request_bytes: usize,

    /// Field-visibility policy per resource type.
    pub policies: Vec<VisibilityPolicyConfig>,
}

impl Default for RbacPdpConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8081".to_owned(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            policies: Vec::new(),
        }
    }
}

/// Field visibility for one resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisibilityPolicyConfig {
    /// Resource type name (e.g. `employees`).
    pub resource_type: String,

    /// Complete, ordered field schema of the resource type.
    ///
    /// `allowed_fields` in decisions follow this order.
    pub schema: Vec<String>,

    /// Per-role visible fields.
    #[serde(default)]
    pub roles: Vec<RoleVisibilityConfig>,
}

/// Visible fields of one role on one resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleVisibilityConfig {
    /// Role identifier as stored in the policy store.
    pub role_id: String,

    /// `full` or an explicit list of schema fields.
    pub fields: FieldAccess,
}

/// Which fields a role may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAccess {
    /// The complete schema.
    Full,
    /// A subset of the schema.
    Fields(Vec<String>),
}

impl Serialize for FieldAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Full => serializer.serialize_str("full"),
            Self::Fields(fields) => {
                let mut seq = serializer.serialize_seq(Some(fields.len()))?;
                for f in fields {
                    seq.serialize_element(f)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Keyword(String),
            Fields(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Keyword(k) if k == "full" => Ok(Self::Full),
            Raw::Keyword(k) => Err(de::Error::custom(format!(
                "unknown field access `{k}`, expected `full` or a list of field names"
            ))),
            Raw::Fields(fields) => Ok(Self::Fields(fields)),
        }
    }
}
