//! Per-request enforcement pipeline.
//!
//! ```text
//! identify -> resolve -> phase-1 -> forward -> capture -> phase-2 -> redact
//! ```
//!
//! Every request is re-resolved and evaluated twice; nothing is cached
//! between requests.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method};
use rbac_pdp_sdk::{ACTION_VIEW, AccessEvaluationClient, EvaluationRequest, PolicyResponse};
use tracing::field::Empty;

use super::error::{EnforcementError, Phase};
use super::resolver::ResourceResolver;
use super::route_policy::{BackendRoutes, BypassMatcher};
use crate::infra::backend::Backend;

/// Header carrying the subject identifier.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resource addressed by a request path.
#[derive(Debug, PartialEq, Eq)]
struct Target<'a> {
    resource_type: &'a str,
    resource_id: Option<&'a str>,
}

impl<'a> Target<'a> {
    /// `/<type>` or `/<type>/<id>[/...]`.
    fn parse(path: &'a str) -> Result<Self, EnforcementError> {
        let mut segments = path.trim_start_matches('/').split('/');
        let resource_type = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(EnforcementError::InvalidPath)?;
        let resource_id = segments.next().filter(|s| !s.is_empty());
        Ok(Self {
            resource_type,
            resource_id,
        })
    }
}

fn subject(headers: &HeaderMap) -> Result<&str, EnforcementError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(EnforcementError::MissingUserId)
}

pub struct Enforcer {
    pdp: Arc<dyn AccessEvaluationClient>,
    resolver: ResourceResolver,
    backend: Arc<dyn Backend>,
    routes: BackendRoutes,
    bypass: BypassMatcher,
}

impl Enforcer {
    #[must_use]
    pub fn new(
        pdp: Arc<dyn AccessEvaluationClient>,
        resolver: ResourceResolver,
        backend: Arc<dyn Backend>,
        routes: BackendRoutes,
        bypass: BypassMatcher,
    ) -> Self {
        Self {
            pdp,
            resolver,
            backend,
            routes,
            bypass,
        }
    }

    /// Run the pipeline and render the outcome.
    ///
    /// Failures are logged here, once, and turned into their public
    /// status and message.
    #[tracing::instrument(
        name = "enforce",
        skip_all,
        fields(
            method = %parts.method,
            path = %parts.uri.path(),
            user_id = Empty,
            resource_type = Empty,
            resource_id = Empty,
        )
    )]
    pub async fn enforce(&self, parts: Parts, body: Bytes) -> Response {
        match self.run(&parts, body).await {
            Ok(response) => response,
            Err(err) => {
                err.log();
                err.into_response()
            }
        }
    }

    async fn run(&self, parts: &Parts, body: Bytes) -> Result<Response, EnforcementError> {
        let path = parts.uri.path();
        if self.bypass.matches(path) {
            let base = self
                .routes
                .default_backend()
                .ok_or_else(|| EnforcementError::NoBackend(path.to_owned()))?;
            tracing::debug!("bypass path, forwarding without evaluation");
            let captured = self.backend.forward(base, parts, body).await?;
            return Ok(captured.into_passthrough());
        }

        let span = tracing::Span::current();
        let user_id = subject(&parts.headers)?;
        span.record("user_id", user_id);

        if parts.method != Method::GET {
            return Err(EnforcementError::MethodNotAllowed);
        }

        let target = Target::parse(path)?;
        span.record("resource_type", target.resource_type);

        let resource_id = match target.resource_id {
            Some(id) => id.to_owned(),
            None => self.resolver.resolve(target.resource_type).await?,
        };
        span.record("resource_id", resource_id.as_str());

        let request =
            EvaluationRequest::new(user_id, target.resource_type, resource_id, ACTION_VIEW);
        self.evaluate(request.clone(), Phase::Authorize).await?;

        let base = self
            .routes
            .for_resource(target.resource_type)
            .ok_or_else(|| EnforcementError::NoBackend(target.resource_type.to_owned()))?;
        let captured = self.backend.forward(base, parts, body).await?;

        let Some(data) = captured.collection_data() else {
            tracing::debug!(
                status = captured.status.as_u16(),
                "response is not collection data, passing through"
            );
            return Ok(captured.into_passthrough());
        };

        let decision = self
            .evaluate(request.with_data(data), Phase::Redact)
            .await?;
        let filtered = decision
            .filtered_data
            .ok_or(EnforcementError::MissingFilteredData)?;

        tracing::info!(
            allowed_fields = ?decision.allowed_fields,
            records = filtered.record_count(),
            "response redacted"
        );
        Ok(captured.into_redacted(&filtered)?)
    }

    async fn evaluate(
        &self,
        request: EvaluationRequest,
        phase: Phase,
    ) -> Result<PolicyResponse, EnforcementError> {
        let decision = self
            .pdp
            .evaluate(request)
            .await
            .map_err(|source| EnforcementError::Evaluation { phase, source })?;
        if !decision.allow {
            return Err(EnforcementError::Denied(phase));
        }
        tracing::debug!(%phase, "access granted");
        Ok(decision)
    }
}
