pub mod backend;
pub mod pdp_client;

pub use backend::{Backend, BackendError, HttpBackend};
pub use pdp_client::HttpEvaluationClient;
