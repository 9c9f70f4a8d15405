//! Error handling module

mod types;

pub use types::{Classified, Classify, FailureKind, PoolError};
