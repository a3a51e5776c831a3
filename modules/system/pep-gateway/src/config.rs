//! Gateway configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tenant whose resources are resolved when none is configured.
pub const DEFAULT_TENANT_ID: &str = "11111111-1111-1111-1111-111111111111";

/// Default bound on a buffered backend response.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PepConfig {
    /// Listen address of the gateway.
    pub listen: String,

    /// Paths forwarded without identification or evaluation.
    ///
    /// `matchit` syntax: `/health`, `/static/{*rest}`.
    pub bypass_paths: Vec<String>,

    /// Tenant scope for resource resolution.
    pub tenant_id: String,

    /// Upper bound on the whole inbound request, evaluation included.
    #[serde(with = "rbac_utils::humantime_serde")]
    pub request_timeout: Duration,

    /// Largest inbound request body accepted.
    pub max_request_body_bytes: usize,

    pub pdp: PdpClientConfig,
    pub backend: BackendConfig,
}

impl Default for PepConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_owned(),
            bypass_paths: vec!["/health".to_owned()],
            tenant_id: DEFAULT_TENANT_ID.to_owned(),
            request_timeout: Duration::from_secs(30),
            max_request_body_bytes: 1024 * 1024,
            pdp: PdpClientConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

/// Remote decision point. Ignored when the PDP runs in-process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdpClientConfig {
    /// Base URL; requests go to `{url}/evaluation`.
    pub url: String,

    #[serde(with = "rbac_utils::humantime_serde")]
    pub timeout: Duration,
}

impl Default for PdpClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8081".to_owned(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Proxied backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Backend for bypass paths and for resource types without a route.
    pub default_url: Option<String>,

    /// Resource type → backend base URL.
    pub routes: BTreeMap<String, String>,

    #[serde(with = "rbac_utils::humantime_serde")]
    pub timeout: Duration,

    /// Responses larger than this are rejected with 502.
    pub max_response_bytes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default_url: None,
            routes: BTreeMap::new(),
            timeout: Duration::from_secs(15),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}
