//! Gateway HTTP surface.
//!
//! Every path is handled by one fallback: the enforcer decides per request
//! whether it is a bypass path or a policy-checked resource read.

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use tower_http::trace::TraceLayer;

use crate::domain::{EnforcementError, Enforcer};

#[derive(Clone)]
pub struct GatewayState {
    enforcer: Arc<Enforcer>,
    request_timeout: Duration,
    max_request_body_bytes: usize,
}

impl GatewayState {
    #[must_use]
    pub fn new(
        enforcer: Arc<Enforcer>,
        request_timeout: Duration,
        max_request_body_bytes: usize,
    ) -> Self {
        Self {
            enforcer,
            request_timeout,
            max_request_body_bytes,
        }
    }
}

/// Build the gateway router.
#[must_use]
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .fallback(handle)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Buffer the inbound body and run the pipeline under the request timeout.
///
/// On timeout the pipeline future is dropped, which abandons any PDP or
/// backend call still in flight.
async fn handle(State(state): State<GatewayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let limit = state.max_request_body_bytes;
    let enforcer = state.enforcer;

    let pipeline = async move {
        let body = to_bytes(body, limit)
            .await
            .map_err(|e| body_error(&e, limit))?;
        Ok::<_, EnforcementError>(enforcer.enforce(parts, body).await)
    };

    let err = match tokio::time::timeout(state.request_timeout, pipeline).await {
        Ok(Ok(response)) => return response,
        Ok(Err(err)) => err,
        Err(_) => EnforcementError::Timeout,
    };
    err.log();
    err.into_response()
}

/// Only an exceeded length limit is a 413; a broken or aborted stream is not.
fn body_error(err: &axum::Error, limit: usize) -> EnforcementError {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            tracing::debug!(limit, "request body exceeds limit");
            return EnforcementError::BodyTooLarge;
        }
        source = cause.source();
    }
    EnforcementError::BodyRead(err.to_string())
}
