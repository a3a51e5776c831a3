//! RBAC PDP SDK
//!
//! This crate provides the public API for the `rbac_pdp` module:
//!
//! - [`AccessEvaluationClient`] - Evaluation API trait used by PEPs
//! - [`PolicyRepository`] - Role/permission/resource lookup contract
//! - [`EvaluationRequest`], [`PolicyResponse`] - Decision wire models
//! - [`CollectionData`] - Collection-keyed JSON payload subject to redaction
//! - [`EvaluationError`], [`RepositoryError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use rbac_pdp_sdk::{AccessEvaluationClient, EvaluationRequest};
//!
//! let request = EvaluationRequest::new("user1", "employees", resource_id, "view");
//! let decision = pdp.evaluate(request).await?;
//! if !decision.allow {
//!     // deny
//! }
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod data;
pub mod error;
pub mod models;
pub mod repo;

// Re-export main types at crate root
pub use api::AccessEvaluationClient;
pub use data::{Collection, CollectionData, Record};
pub use error::{EvaluationError, RepositoryError};
pub use models::{
    ACTION_VIEW, EvaluationRequest, MESSAGE_DENIED, MESSAGE_GRANTED, Permission, PolicyResponse,
    ResourceRef, Role, SubjectGrants,
};
pub use repo::PolicyRepository;
