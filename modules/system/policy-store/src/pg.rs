//! PostgreSQL-backed repository.

use async_trait::async_trait;
use rbac_pdp_sdk::{Permission, PolicyRepository, RepositoryError, Role, SubjectGrants};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::PostgresStoreConfig;

const ROLES_SQL: &str = "
SELECT r.id::text, r.name::text, COALESCE(r.description, '')::text
FROM roles r
JOIN user_roles ur ON r.id = ur.role_id
WHERE ur.user_id::text = $1
ORDER BY r.id";

const PERMISSIONS_SQL: &str = "
SELECT r.id::text, res.id::text, a.name::text
FROM roles r
JOIN role_permissions rp ON r.id = rp.role_id
JOIN resources res ON rp.resource_id = res.id
JOIN actions a ON rp.action_id = a.id
JOIN user_roles ur ON r.id = ur.role_id
WHERE ur.user_id::text = $1";

const RESOURCE_IDS_SQL: &str = "
SELECT id::text
FROM resources
WHERE name = $1
  AND tenant_id::text = $2
ORDER BY id";

/// [`PolicyRepository`] over a pooled PostgreSQL connection.
#[derive(Debug, Clone)]
pub struct PgPolicyRepository {
    pool: PgPool,
}

impl PgPolicyRepository {
    /// Open the pool described by `cfg`.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the first connection cannot be opened.
    pub async fn connect(cfg: &PostgresStoreConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.acquire_timeout)
            .connect(&cfg.dsn)
            .await?;
        tracing::info!(max_connections = cfg.max_connections, "policy store pool ready");
        Ok(Self::from_pool(pool))
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(op: &str, e: sqlx::Error) -> RepositoryError {
    tracing::error!(operation = op, error = %e, "policy store query failed");
    match e {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_) => RepositoryError::InvalidRow(e.to_string()),
        other => RepositoryError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl PolicyRepository for PgPolicyRepository {
    async fn roles_and_permissions(
        &self,
        subject_id: &str,
    ) -> Result<SubjectGrants, RepositoryError> {
        let roles = sqlx::query_as::<_, (String, String, String)>(ROLES_SQL)
            .bind(subject_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx("roles", e))?
            .into_iter()
            .map(|(id, name, description)| Role {
                id,
                name,
                description,
            })
            .collect();

        let permissions = sqlx::query_as::<_, (String, String, String)>(PERMISSIONS_SQL)
            .bind(subject_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx("permissions", e))?
            .into_iter()
            .map(|(role, resource_id, action)| Permission {
                role,
                resource_id,
                action,
            })
            .collect();

        Ok(SubjectGrants::new(roles, permissions))
    }

    async fn resource_ids(
        &self,
        resource_type: &str,
        tenant_id: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String,)>(RESOURCE_IDS_SQL)
            .bind(resource_type)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx("resource_ids", e))?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("policy store pool closed");
    }
}
