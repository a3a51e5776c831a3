//! Server configuration: YAML file overlaid with `RBAC__*` environment
//! variables.

use std::path::Path;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use pep_gateway::PepConfig;
use policy_store::StoreConfig;
use rbac_pdp::RbacPdpConfig;
use serde::{Deserialize, Serialize};

/// Environment prefix; `RBAC__PEP__LISTEN` sets `pep.listen`.
pub const ENV_PREFIX: &str = "RBAC__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub pep: PepConfig,
    pub pdp: RbacPdpConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Load `path` and apply environment overrides.
///
/// # Errors
///
/// Fails if the file is missing or the merged configuration does not
/// deserialize.
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
    anyhow::ensure!(
        path.is_file(),
        "config file `{}` does not exist",
        path.display()
    );
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .with_context(|| format!("invalid configuration in `{}`", path.display()))
}
