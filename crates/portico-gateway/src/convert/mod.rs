//! Stateless mappings between the external wire formats and the upstream
//! format, one direction per function

pub mod claude;
pub mod openai;
pub mod request;
