pub mod enforcer;
pub mod error;
pub mod interceptor;
pub mod resolver;
pub mod route_policy;

pub use enforcer::{Enforcer, USER_ID_HEADER};
pub use error::{EnforcementError, Phase};
pub use interceptor::CapturedResponse;
pub use resolver::{ResolveError, ResourceResolver};
pub use route_policy::{BackendRoutes, BypassMatcher, RoutePolicyError};
