//! Invoker contract consumed by the execution engine

use crate::error::Classify;
use crate::services::key_pool::Credential;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;

/// Performs one real unit of work bound to a single credential
///
/// Implementations must not keep state between attempts: each call gets the
/// candidate credential and reports either a result or a classified failure.
#[async_trait]
pub trait CallInvoker: Send + Sync {
    type Output: Send;
    type Error: Classify + Send;

    async fn invoke(&self, credential: &Credential) -> Result<Self::Output, Self::Error>;
}

/// Invoker built from an async closure taking the credential by value
pub struct FnInvoker<F> {
    f: F,
}

impl<F> FnInvoker<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnInvoker<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInvoker").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut, T, E> CallInvoker for FnInvoker<F>
where
    F: Fn(Credential) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Classify + Send + 'static,
{
    type Output = T;
    type Error = E;

    async fn invoke(&self, credential: &Credential) -> Result<T, E> {
        (self.f)(credential.clone()).await
    }
}

/// Wrap an async closure as a [`CallInvoker`]
///
/// # Example
/// ```
/// use llm_key_rotator::error::Classified;
/// use llm_key_rotator::services::rotation::invoker_fn;
///
/// let invoker = invoker_fn(|key| async move {
///     if key.expose() == "sk-good" {
///         Ok("done")
///     } else {
///         Err(Classified::retryable("rate limited"))
///     }
/// });
/// # let _ = invoker;
/// ```
pub fn invoker_fn<F, Fut, T, E>(f: F) -> FnInvoker<F>
where
    F: Fn(Credential) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    FnInvoker::new(f)
}
