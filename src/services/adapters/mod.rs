//! Adapters Module
//!
//! Present the two common call shapes as credential-rotating values:
//! - [`RotatingClient`]: a client object rebuilt for every key
//! - [`RotatingCompletion`]: a free function that takes the key per call
//!
//! [`RotatingTarget`] picks between them from a [`TargetKind`].

mod client;
mod function;
mod target;

pub use client::{ClientInvoker, RotatingClient};
pub use function::{FunctionInvoker, RotatingCompletion};
pub use target::{RotatingTarget, TargetKind};
