//! Request rate limiting with per-route-class quotas keyed by client IP.

pub mod error;
pub mod memory;
pub mod request;

pub use error::RateLimitError;
pub use memory::MemoryLimiter;
pub use request::{RequestLimiter, RouteClass};
