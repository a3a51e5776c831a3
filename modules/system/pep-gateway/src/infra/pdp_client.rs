//! HTTP client for a remote RBAC PDP.

use std::time::Duration;

use async_trait::async_trait;
use http::header;
use rbac_pdp_sdk::{AccessEvaluationClient, EvaluationError, EvaluationRequest, PolicyResponse};
use url::Url;

/// Calls `POST {base}/evaluation`.
///
/// Any non-2xx status, transport failure, timeout or malformed body is an
/// [`EvaluationError`]; none of them is read as a deny.
#[derive(Debug, Clone)]
pub struct HttpEvaluationClient {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpEvaluationClient {
    /// # Errors
    ///
    /// Returns the parse error when `base_url` is not a valid URL.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?;
        let endpoint = Url::parse(&format!(
            "{}/evaluation",
            base.as_str().trim_end_matches('/')
        ))?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn transport(e: &reqwest::Error) -> EvaluationError {
    if e.is_timeout() {
        EvaluationError::Timeout
    } else {
        EvaluationError::Transport(e.to_string())
    }
}

#[async_trait]
impl AccessEvaluationClient for HttpEvaluationClient {
    async fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> Result<PolicyResponse, EvaluationError> {
        let payload =
            serde_json::to_vec(&request).map_err(|e| EvaluationError::Internal(e.to_string()))?;
        if request.has_data() {
            tracing::debug!(bytes = payload.len(), "sending phase-2 payload to PDP");
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EvaluationError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| transport(&e))?;
        serde_json::from_slice(&body).map_err(|e| EvaluationError::Decode(e.to_string()))
    }
}
