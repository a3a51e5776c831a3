//! Captured backend responses.
//!
//! A [`CapturedResponse`] is the fully buffered backend answer. It is either
//! released unchanged or replaced by a redacted body; it is never streamed
//! to the caller before phase 2 has run.

use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use rbac_pdp_sdk::CollectionData;

/// Connection-scoped headers that must not cross the proxy.
static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(&listed) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedResponse {
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Decode the body as collection-keyed JSON.
    ///
    /// `None` for an empty body or any other shape; such responses skip
    /// redaction.
    #[must_use]
    pub fn collection_data(&self) -> Option<CollectionData> {
        if self.body.is_empty() {
            return None;
        }
        CollectionData::from_slice(&self.body)
    }

    /// Release the response unchanged (minus hop-by-hop headers).
    #[must_use]
    pub fn into_passthrough(self) -> Response {
        let mut headers = self.headers;
        strip_hop_by_hop(&mut headers);
        build(self.status, headers, Body::from(self.body))
    }

    /// Replace the body with `filtered`, keeping the backend status and
    /// headers and forcing a JSON content type.
    ///
    /// # Errors
    ///
    /// Returns the encoder error if `filtered` cannot be serialized.
    pub fn into_redacted(self, filtered: &CollectionData) -> Result<Response, serde_json::Error> {
        let body = serde_json::to_vec(filtered)?;

        let mut headers = self.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::CONTENT_ENCODING);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        Ok(build(self.status, headers, Body::from(body)))
    }
}

fn build(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
