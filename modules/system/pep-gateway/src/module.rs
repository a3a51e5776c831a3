//! Gateway assembly from configuration.

use std::sync::Arc;

use axum::Router;
use rbac_pdp_sdk::{AccessEvaluationClient, PolicyRepository};

use crate::api::{GatewayState, router};
use crate::config::PepConfig;
use crate::domain::{BackendRoutes, BypassMatcher, Enforcer, ResourceResolver, RoutePolicyError};
use crate::infra::{HttpBackend, HttpEvaluationClient};

#[derive(Debug, thiserror::Error)]
pub enum GatewayInitError {
    #[error(transparent)]
    Routes(#[from] RoutePolicyError),

    #[error("invalid PDP URL: {0}")]
    PdpUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Policy enforcement gateway.
///
/// Holds the enforcer built from [`PepConfig`]; the decision point is either
/// in-process ([`PepGateway::new`]) or remote ([`PepGateway::with_remote_pdp`]).
pub struct PepGateway {
    state: GatewayState,
}

impl PepGateway {
    /// # Errors
    ///
    /// Returns [`GatewayInitError`] if a bypass pattern or backend URL is
    /// invalid, or the HTTP client cannot be built.
    #[tracing::instrument(skip_all, fields(tenant_id = %cfg.tenant_id))]
    pub fn new(
        cfg: &PepConfig,
        pdp: Arc<dyn AccessEvaluationClient>,
        repo: Arc<dyn PolicyRepository>,
    ) -> Result<Self, GatewayInitError> {
        let bypass = BypassMatcher::new(&cfg.bypass_paths)?;
        let routes = BackendRoutes::from_config(&cfg.backend)?;
        let backend = HttpBackend::new(
            reqwest::Client::builder().build()?,
            cfg.backend.timeout,
            cfg.backend.max_response_bytes,
        );

        tracing::info!(
            bypass_paths = ?cfg.bypass_paths,
            routes = cfg.backend.routes.len(),
            default_backend = cfg.backend.default_url.as_deref().unwrap_or("<none>"),
            "Initializing pep gateway"
        );

        let enforcer = Enforcer::new(
            pdp,
            ResourceResolver::new(repo, cfg.tenant_id.clone()),
            Arc::new(backend),
            routes,
            bypass,
        );
        Ok(Self {
            state: GatewayState::new(
                Arc::new(enforcer),
                cfg.request_timeout,
                cfg.max_request_body_bytes,
            ),
        })
    }

    /// Gateway evaluating against the PDP at `cfg.pdp.url`.
    ///
    /// # Errors
    ///
    /// As [`PepGateway::new`], plus [`GatewayInitError::PdpUrl`].
    pub fn with_remote_pdp(
        cfg: &PepConfig,
        repo: Arc<dyn PolicyRepository>,
    ) -> Result<Self, GatewayInitError> {
        let client = HttpEvaluationClient::new(
            reqwest::Client::builder().build()?,
            &cfg.pdp.url,
            cfg.pdp.timeout,
        )?;
        tracing::info!(endpoint = %client.endpoint(), "using remote PDP");
        Self::new(cfg, Arc::new(client), repo)
    }

    #[must_use]
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }
}
