//! LLM Key Rotator library
//!
//! Runs an LLM call against a pool of API keys, moving to the next key
//! whenever the current one is rate limited.

// Public modules
pub mod config;
pub mod converters;
pub mod error;
pub mod logging;
pub mod schemas;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use error::{Classified, Classify, FailureKind, PoolError};
pub use services::adapters::{RotatingClient, RotatingCompletion, RotatingTarget, TargetKind};
pub use services::key_pool::{Credential, CredentialPool};
pub use services::providers::ProviderError;
pub use services::rotation::{CallInvoker, ExecutionEngine, ExecutionReport};
