//! Gemini client for Google Gemini API interactions
//!
//! Non-streaming `generateContent` over REST. The key is passed per call, so
//! one client can serve every credential of a pool.

use super::error::{ProviderError, DEFAULT_RETRYABLE_STATUSES};
use super::http::{join_url, send_json};
use super::openai::DEFAULT_TIMEOUT_SECS;
use crate::schemas::gemini::{GeminiRequest, GeminiResponse};
use crate::services::key_pool::Credential;
use reqwest::Client;
use std::time::Duration;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    timeout_seconds: u64,
    retryable_statuses: Vec<u16>,
}

impl GeminiClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: GEMINI_API_BASE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_retryable_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.retryable_statuses = statuses;
        self
    }

    /// Generate content (non-streaming)
    ///
    /// # Arguments
    /// * `credential` - API key sent as `x-goog-api-key`
    /// * `model` - Model name (e.g., "gemini-2.0-flash")
    /// * `request` - The request body
    pub async fn generate_content(
        &self,
        credential: &Credential,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, ProviderError> {
        let url = join_url(&self.base_url, &format!("models/{}:generateContent", model));

        tracing::debug!(
            model = %model,
            url = %url,
            "Calling Gemini generateContent API"
        );

        let builder = self
            .http
            .post(&url)
            .header("x-goog-api-key", credential.expose())
            .timeout(Duration::from_secs(self.timeout_seconds))
            .json(request);

        send_json(builder, &self.retryable_statuses).await
    }
}
