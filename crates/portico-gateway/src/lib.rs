//! Protocol translation gateway: accepts Claude-style and OpenAI-style
//! completion requests, calls an Azure Responses upstream under a
//! resilience policy, and translates buffered or streamed results back
//! into the caller's format.

pub mod convert;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod provider;
pub mod state;
pub mod stream;
pub mod validate;

pub use error::GatewayError;
pub use handler::gateway_router;
pub use state::{CompletionOutcome, GatewayState};
