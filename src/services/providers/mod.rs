//! Providers Module
//!
//! Thin HTTP clients for the LLM APIs the adapters rotate keys for. Each
//! call is bound to one credential and reports failures as a classified
//! [`ProviderError`].

mod completion;
mod error;
mod gemini;
mod http;
mod openai;

pub use completion::{completion, CompletionOptions, Provider};
pub use error::{ProviderError, DEFAULT_RETRYABLE_STATUSES, MAX_ERROR_BODY_CHARS};
pub use gemini::{GeminiClient, GEMINI_API_BASE};
pub use http::build_client;
pub use openai::{ClientOptions, OpenAiClient, DEFAULT_TIMEOUT_SECS, OPENAI_API_BASE};
