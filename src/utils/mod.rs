//! Utility modules
//!
//! Contains string helpers shared by the engine, the providers and logging.

pub mod string;

pub use string::{mask_secret, truncate_str, truncate_with_suffix, MASK_SUFFIX};
