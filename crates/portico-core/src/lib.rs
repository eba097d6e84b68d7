#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod context;
mod error;
pub mod redact;

pub use context::{CorrelationId, RequestContext};
pub use error::{HttpError, error_body};
