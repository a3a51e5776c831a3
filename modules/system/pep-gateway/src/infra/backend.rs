//! Forwarding to backend services.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::header::{self, HeaderMap};
use http::request::Parts;
use url::Url;

use crate::domain::interceptor::{CapturedResponse, strip_hop_by_hop};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend timed out")]
    Timeout,

    #[error("backend response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
}

/// Sends the inbound request to a backend and buffers the full response.
#[async_trait]
pub trait Backend: Send + Sync {
    /// # Errors
    ///
    /// Returns [`BackendError`] on transport failure, timeout, or when the
    /// response exceeds the configured size bound.
    async fn forward(
        &self,
        base: &Url,
        parts: &Parts,
        body: Bytes,
    ) -> Result<CapturedResponse, BackendError>;
}

/// `reqwest`-based [`Backend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    timeout: Duration,
    max_response_bytes: usize,
}

impl HttpBackend {
    #[must_use]
    pub fn new(client: reqwest::Client, timeout: Duration, max_response_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_response_bytes,
        }
    }
}

/// Append the inbound path and query to `base`, keeping any base path prefix.
pub(crate) fn target_url(base: &Url, parts: &Parts) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}{}", parts.uri.path()));
    url.set_query(parts.uri.query());
    url
}

fn forwarded_headers(parts: &Parts) -> HeaderMap {
    let mut headers = parts.headers.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers
}

fn map_reqwest(e: &reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Unreachable(e.to_string())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[tracing::instrument(skip_all, fields(method = %parts.method, base = %base))]
    async fn forward(
        &self,
        base: &Url,
        parts: &Parts,
        body: Bytes,
    ) -> Result<CapturedResponse, BackendError> {
        let url = target_url(base, parts);
        tracing::debug!(%url, "forwarding to backend");

        let mut response = self
            .client
            .request(parts.method.clone(), url)
            .headers(forwarded_headers(parts))
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest(&e))?;

        let limit = self.max_response_bytes;
        let declared_too_large = response
            .content_length()
            .is_some_and(|len| u64::try_from(limit).is_ok_and(|max| len > max));
        if declared_too_large {
            return Err(BackendError::ResponseTooLarge { limit });
        }

        let status = response.status();
        let headers = response.headers().clone();
        let mut buf = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| map_reqwest(&e))? {
            if buf.len() + chunk.len() > limit {
                return Err(BackendError::ResponseTooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }

        tracing::debug!(status = status.as_u16(), bytes = buf.len(), "backend responded");
        Ok(CapturedResponse::new(status, headers, buf.freeze()))
    }
}
