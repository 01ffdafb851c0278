//! Client for the external AI agent.

mod http;

pub use http::{GenerationConfig, HttpGenerationGateway};
