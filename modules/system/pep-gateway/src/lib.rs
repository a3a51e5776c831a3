//! RBAC policy enforcement gateway.
//!
//! Sits in front of backend services and, for every `GET /<type>[/<id>]`:
//! identifies the caller from `X-User-ID`, resolves the resource, asks the
//! PDP whether the read is allowed, forwards it, and has the PDP redact the
//! captured collection data before it reaches the caller.
//!
//! - [`config`] - Listen address, bypass paths, PDP and backend settings
//! - [`domain`] - Enforcement pipeline, resolver, routing and response capture
//! - [`infra`] - `reqwest` clients for the PDP and the backends
//! - [`api`] - axum router with request timeout and body bound

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use config::{BackendConfig, PdpClientConfig, PepConfig};
pub use domain::{EnforcementError, Enforcer, Phase, USER_ID_HEADER};
pub use infra::{HttpBackend, HttpEvaluationClient};
pub use module::{GatewayInitError, PepGateway};
