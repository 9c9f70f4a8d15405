//! Services module
//!
//! The rotation engine, the credential pool it walks, and the provider
//! clients and adapters built on top of them.

pub mod adapters;
pub mod key_pool;
pub mod providers;
pub mod rotation;

pub use adapters::{RotatingClient, RotatingCompletion, RotatingTarget, TargetKind};
pub use key_pool::{Credential, CredentialPool, KeySource};
pub use providers::{ClientOptions, CompletionOptions, ProviderError};
pub use rotation::{AttemptObserver, ExecutionEngine, ExecutionReport};
