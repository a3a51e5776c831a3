//! Policy store implementations of [`rbac_pdp_sdk::PolicyRepository`].
//!
//! - [`StaticPolicyRepository`] - grants declared in configuration
//! - `PgPolicyRepository` - PostgreSQL via `sqlx` (feature `pg`)

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
#[cfg(feature = "pg")]
pub mod pg;
pub mod static_repo;

use std::sync::Arc;

use rbac_pdp_sdk::PolicyRepository;

pub use config::{
    PostgresStoreConfig, ResourceRecord, RoleAssignment, StaticStoreConfig, StoreConfig,
};
#[cfg(feature = "pg")]
pub use pg::PgPolicyRepository;
pub use static_repo::{StaticPolicyRepository, StaticStoreError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid static store: {0}")]
    Static(#[from] StaticStoreError),

    #[cfg(feature = "pg")]
    #[error("cannot connect to policy database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("store kind `{0}` is not compiled in")]
    Unsupported(&'static str),
}

/// Build the repository selected by `cfg`.
///
/// # Errors
///
/// Returns [`StoreError`] if the static declaration is inconsistent or the
/// database cannot be reached.
pub async fn connect(cfg: &StoreConfig) -> Result<Arc<dyn PolicyRepository>, StoreError> {
    match cfg {
        StoreConfig::Static(s) => {
            let repo = StaticPolicyRepository::from_config(s)?;
            tracing::info!(
                roles = s.roles.len(),
                resources = s.resources.len(),
                "using static policy store"
            );
            Ok(Arc::new(repo))
        }
        #[cfg(feature = "pg")]
        StoreConfig::Postgres(pg) => Ok(Arc::new(PgPolicyRepository::connect(pg).await?)),
        #[cfg(not(feature = "pg"))]
        StoreConfig::Postgres(_) => Err(StoreError::Unsupported("postgres")),
    }
}
