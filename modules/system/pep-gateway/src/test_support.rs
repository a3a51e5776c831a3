#![allow(clippy::unwrap_used, clippy::expect_used)]

//! In-memory doubles for the gateway's collaborators.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use http::request::Parts;
use rbac_pdp_sdk::{
    AccessEvaluationClient, CollectionData, EvaluationError, EvaluationRequest, PolicyRepository,
    PolicyResponse, RepositoryError, SubjectGrants,
};
use url::Url;

use crate::domain::interceptor::CapturedResponse;
use crate::infra::backend::{Backend, BackendError};

/// Resource registry; subjects always have empty grants.
#[derive(Default)]
pub struct MockRepository {
    resources: Vec<(String, String, String)>,
    failure: Option<RepositoryError>,
    calls: AtomicUsize,
}

impl MockRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing(err: RepositoryError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_resource(mut self, resource_type: &str, tenant_id: &str, id: &str) -> Self {
        self.resources.push((
            resource_type.to_owned(),
            tenant_id.to_owned(),
            id.to_owned(),
        ));
        self
    }

    /// Number of `resource_ids` lookups served.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicyRepository for MockRepository {
    async fn roles_and_permissions(
        &self,
        _subject_id: &str,
    ) -> Result<SubjectGrants, RepositoryError> {
        Ok(SubjectGrants::default())
    }

    async fn resource_ids(
        &self,
        resource_type: &str,
        tenant_id: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let mut ids: Vec<String> = self
            .resources
            .iter()
            .filter(|(t, tenant, _)| t == resource_type && tenant == tenant_id)
            .map(|(_, _, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Decision point that answers from a queue, in order, and records every
/// request it receives.
#[derive(Default)]
pub struct ScriptedPdp {
    replies: Mutex<VecDeque<Result<PolicyResponse, EvaluationError>>>,
    requests: Mutex<Vec<EvaluationRequest>>,
}

impl ScriptedPdp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reply(self, reply: Result<PolicyResponse, EvaluationError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    #[must_use]
    pub fn allow(self, fields: &[&str]) -> Self {
        self.reply(Ok(PolicyResponse::granted(owned(fields))))
    }

    #[must_use]
    pub fn allow_filtered(self, fields: &[&str], data: CollectionData) -> Self {
        self.reply(Ok(PolicyResponse::granted(owned(fields)).with_filtered_data(data)))
    }

    #[must_use]
    pub fn deny(self) -> Self {
        self.reply(Ok(PolicyResponse::denied()))
    }

    #[must_use]
    pub fn fail(self, err: EvaluationError) -> Self {
        self.reply(Err(err))
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<EvaluationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| (*f).to_owned()).collect()
}

#[async_trait]
impl AccessEvaluationClient for ScriptedPdp {
    async fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> Result<PolicyResponse, EvaluationError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EvaluationError::Internal("no scripted reply".to_owned())))
    }
}

/// Backend returning one fixed reply and counting calls.
pub struct RecordingBackend {
    reply: Result<CapturedResponse, BackendError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    bases: Mutex<Vec<Url>>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new(reply: Result<CapturedResponse, BackendError>) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            bases: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn json(status: StatusCode, body: &str) -> Self {
        Self::with_content_type(status, "application/json", body)
    }

    #[must_use]
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::with_content_type(status, "text/plain", body)
    }

    #[must_use]
    pub fn failing(err: BackendError) -> Self {
        Self::new(Err(err))
    }

    /// Sleep before replying.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_content_type(status: StatusCode, content_type: &'static str, body: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self::new(Ok(CapturedResponse::new(
            status,
            headers,
            Bytes::from(body.to_owned()),
        )))
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Base URLs the backend was called with, in order.
    #[must_use]
    pub fn bases(&self) -> Vec<Url> {
        self.bases.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn forward(
        &self,
        base: &Url,
        _parts: &Parts,
        _body: Bytes,
    ) -> Result<CapturedResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bases.lock().unwrap().push(base.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}
