//! Converters module
//!
//! Contains logic for converting between API formats:
//! - OpenAI request -> Gemini request
//! - Gemini response -> OpenAI response
//!
//! # Usage
//!
//! ```rust,ignore
//! use llm_key_rotator::converters::{GeminiToOpenAIConverter, OpenAIToGeminiConverter};
//!
//! let (model, gemini_request) = OpenAIToGeminiConverter::new().convert_request(&openai_request)?;
//! let openai_response = GeminiToOpenAIConverter::new().convert_response(&gemini_response, &model)?;
//! ```

pub mod gemini_to_openai;
pub mod openai_to_gemini;

pub use gemini_to_openai::{GeminiToOpenAIConverter, GeminiToOpenAIError};
pub use openai_to_gemini::{OpenAIToGeminiConverter, OpenAIToGeminiError};
