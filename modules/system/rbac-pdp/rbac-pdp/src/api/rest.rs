//! PDP HTTP surface.
//!
//! - `POST /evaluation` - evaluate a phase-1 or phase-2 request; `200` for
//!   both allow and deny
//! - `GET /health` - liveness check

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rbac_pdp_sdk::EvaluationRequest;

use crate::domain::{DomainError, Service};

/// Build the PDP router.
///
/// `max_request_bytes` bounds the evaluation body; a phase-2 request carries
/// a whole backend response, so it must be at least the gateway's
/// response bound.
#[must_use]
pub fn router(svc: Arc<Service>, max_request_bytes: usize) -> Router {
    Router::new()
        .route("/evaluation", post(evaluate))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .with_state(svc)
}

async fn evaluate(
    State(svc): State<Arc<Service>>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            let status = rejection.status();
            tracing::info!(%status, error = %rejection, "rejected evaluation request");
            return (status, rejection.body_text()).into_response();
        }
    };

    match svc.evaluate(request).await {
        Ok(decision) => Json(decision).into_response(),
        Err(e) => domain_error_to_response(&e),
    }
}

fn domain_error_to_response(err: &DomainError) -> Response {
    match err {
        DomainError::InvalidRequest(msg) => {
            tracing::info!("invalid evaluation request: {msg}");
            (StatusCode::BAD_REQUEST, msg.clone()).into_response()
        }
        other => {
            tracing::error!(error = %other, "evaluation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Evaluation failed").into_response()
        }
    }
}
