//! Assay LLM
//!
//! Provides the inference boundary of the analysis pipeline:
//! - `InferenceClient` - the injected port the analyzer calls
//! - `OpenAiCompatibleClient` - chat-completions implementation over HTTP
//! - `DisabledClient` - used when no credentials are configured
//! - `TokenSource` implementations (static API key, cached token endpoint)
//!
//! Also includes the HTTP client factory and the request/error types shared
//! with the analysis crate.

pub mod auth;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use auth::{CachedTokenSource, StaticToken, TokenSource};
pub use http_client::build_http_client;
pub use openai::OpenAiCompatibleClient;
pub use provider::{build_inference_client, DisabledClient, InferenceClient};
pub use types::*;
