//! Domain layer for the RBAC PDP.

pub mod engine;
pub mod error;
pub mod local_client;
pub mod redact;
pub mod service;
pub mod visibility;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{DecisionEngine, EngineError};
pub use error::DomainError;
pub use local_client::RbacPdpLocalClient;
pub use redact::redact;
pub use service::Service;
pub use visibility::{VisibilityConfigError, VisibilityTable};
