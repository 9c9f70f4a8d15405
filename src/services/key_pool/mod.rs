//! Key Pool Module
//!
//! Credentials and the ordered pool the execution engine falls back through.
//!
//! # Example
//! ```
//! use llm_key_rotator::services::key_pool::CredentialPool;
//!
//! // One key or many: both normalize to a pool, trial order = list order
//! let single = CredentialPool::normalize("sk-primary").unwrap();
//! let many = CredentialPool::normalize(vec!["sk-primary", "sk-backup"]).unwrap();
//!
//! assert_eq!(single.len(), 1);
//! assert_eq!(many.first().expose(), "sk-primary");
//! ```

mod credential;
mod pool;

pub use credential::{Credential, DEFAULT_MASK_PREFIX};
pub use pool::{CredentialPool, Iter, KeySource};
