pub mod router;

pub use router::{GatewayState, router};
