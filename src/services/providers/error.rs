//! Provider error type and its retry classification

use crate::converters::{GeminiToOpenAIError, OpenAIToGeminiError};
use crate::error::{Classify, FailureKind};
use crate::schemas::gemini::GeminiError;
use crate::schemas::openai::OpenAIErrorResponse;
use crate::utils::{truncate_with_suffix, MASK_SUFFIX};
use thiserror::Error;

/// Longest raw error body kept in an [`ProviderError::Api`] message
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// HTTP statuses treated as retryable when nothing else is configured
pub const DEFAULT_RETRYABLE_STATUSES: &[u16] = &[429];

/// Errors that can occur when calling a provider API
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl ProviderError {
    /// Build an `Api` error from a non-success response body
    ///
    /// The provider's `error.message` is used when the body carries one,
    /// otherwise the raw body truncated to [`MAX_ERROR_BODY_CHARS`].
    pub fn from_status(status: u16, body: &str, retryable_statuses: &[u16]) -> Self {
        let message = extract_error_message(body)
            .unwrap_or_else(|| truncate_with_suffix(body.trim(), MAX_ERROR_BODY_CHARS, MASK_SUFFIX));

        ProviderError::Api {
            status,
            message,
            retryable: retryable_statuses.contains(&status),
        }
    }

    /// HTTP status of an `Api` error
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            ProviderError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    if let Ok(err) = serde_json::from_str::<OpenAIErrorResponse>(body) {
        return Some(err.error.message);
    }
    serde_json::from_str::<GeminiError>(body)
        .ok()
        .map(|err| err.error.message)
}

impl Classify for ProviderError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            ProviderError::Api {
                retryable: true, ..
            } => FailureKind::Retryable,
            _ => FailureKind::Fatal,
        }
    }
}

impl From<OpenAIToGeminiError> for ProviderError {
    fn from(err: OpenAIToGeminiError) -> Self {
        ProviderError::Conversion(err.to_string())
    }
}

impl From<GeminiToOpenAIError> for ProviderError {
    fn from(err: GeminiToOpenAIError) -> Self {
        ProviderError::Conversion(err.to_string())
    }
}
