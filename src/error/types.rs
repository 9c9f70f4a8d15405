//! Error types for credential pools and failure classification

use std::fmt;
use thiserror::Error;

/// Errors raised while building a [`CredentialPool`](crate::services::CredentialPool)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Invalid credential input: expected a string or a list of strings, got {0}")]
    InvalidInput(String),

    #[error("Credential pool is empty: at least one credential is required")]
    EmptyPool,
}

/// How the engine should react to a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Credential-specific and transient (e.g. rate limited): try the next credential
    Retryable,
    /// Switching credentials cannot help: stop immediately
    Fatal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Retryable => write!(f, "retryable"),
            FailureKind::Fatal => write!(f, "fatal"),
        }
    }
}

/// Retry predicate consulted by the execution engine
///
/// Invoker error types implement this to say whether a failure warrants
/// switching to the next credential. Anything not explicitly retryable
/// should be reported as [`FailureKind::Fatal`].
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;

    fn is_retryable(&self) -> bool {
        self.failure_kind() == FailureKind::Retryable
    }
}

/// An error paired with an explicit classification
///
/// Lets callers use the engine with error types that carry no
/// classification of their own (`std::io::Error`, `anyhow::Error`, ...).
#[derive(Debug)]
pub struct Classified<E> {
    kind: FailureKind,
    error: E,
}

impl<E> Classified<E> {
    pub fn new(kind: FailureKind, error: E) -> Self {
        Self { kind, error }
    }

    /// Mark an error as retryable with the next credential
    pub fn retryable(error: E) -> Self {
        Self::new(FailureKind::Retryable, error)
    }

    /// Mark an error as fatal
    pub fn fatal(error: E) -> Self {
        Self::new(FailureKind::Fatal, error)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn error(&self) -> &E {
        &self.error
    }

    pub fn into_inner(self) -> E {
        self.error
    }
}

impl<E> Classify for Classified<E> {
    fn failure_kind(&self) -> FailureKind {
        self.kind
    }
}

impl<E: fmt::Display> fmt::Display for Classified<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl<E> std::error::Error for Classified<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
