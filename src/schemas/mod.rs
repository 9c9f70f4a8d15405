//! Schema module
//!
//! Serde models for the provider wire formats.

pub mod gemini;
pub mod openai;
