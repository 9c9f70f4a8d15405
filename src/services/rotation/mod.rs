//! Rotation Module
//!
//! The credential-rotating execution engine, the invoker contract it drives
//! and the observers it reports attempts to.
//!
//! # Example
//! ```
//! use llm_key_rotator::error::Classified;
//! use llm_key_rotator::services::key_pool::CredentialPool;
//! use llm_key_rotator::services::rotation::{invoker_fn, ExecutionEngine};
//!
//! # tokio_test_block(async {
//! let pool = CredentialPool::normalize(vec!["sk-limited", "sk-fresh"]).unwrap();
//! let invoker = invoker_fn(|key| async move {
//!     match key.expose() {
//!         "sk-limited" => Err(Classified::retryable("429 Too Many Requests")),
//!         other => Ok(format!("answered with {}", other)),
//!     }
//! });
//!
//! let answer = ExecutionEngine::new().execute(&pool, &invoker).await.unwrap();
//! assert_eq!(answer, "answered with sk-fresh");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod engine;
mod invoker;
mod observer;

pub use engine::{Attempt, AttemptOutcome, ExecutionEngine, ExecutionReport};
pub use invoker::{invoker_fn, CallInvoker, FnInvoker};
pub use observer::{
    AttemptEvent, AttemptObserver, ConsoleObserver, ObserverSet, RecordingObserver,
    TracingObserver,
};
