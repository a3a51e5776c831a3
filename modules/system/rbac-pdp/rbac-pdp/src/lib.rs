//! RBAC policy decision point.
//!
//! - [`config`] - Field-visibility policy configuration
//! - [`domain`] - Visibility table, decision engine, redaction and the PDP service
//! - [`api`] - REST surface (`POST /evaluation`)

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;

pub use config::{FieldAccess, RbacPdpConfig, RoleVisibilityConfig, VisibilityPolicyConfig};
pub use domain::{
    DecisionEngine, DomainError, EngineError, RbacPdpLocalClient, Service, VisibilityConfigError,
    VisibilityTable,
};
