//! Provider-routing completion function
//!
//! `completion` takes the API key as an argument instead of holding it, and
//! picks the provider from the model name: `gemini/<model>` goes to Gemini,
//! `openai/<model>` or a bare model name goes to an OpenAI-compatible API.

use super::error::{ProviderError, DEFAULT_RETRYABLE_STATUSES};
use super::gemini::{GeminiClient, GEMINI_API_BASE};
use super::openai::{ClientOptions, OpenAiClient, DEFAULT_TIMEOUT_SECS, OPENAI_API_BASE};
use crate::converters::{GeminiToOpenAIConverter, OpenAIToGeminiConverter};
use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::services::key_pool::Credential;
use reqwest::Client;
use std::fmt;

// ============================================================================
// Provider Routing
// ============================================================================

/// Backend a model name routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    /// Split a model name into its provider and the provider-side model ID
    pub fn route(model: &str) -> (Provider, &str) {
        if let Some(name) = model.strip_prefix("gemini/") {
            (Provider::Gemini, name)
        } else if let Some(name) = model.strip_prefix("openai/") {
            (Provider::OpenAi, name)
        } else {
            (Provider::OpenAi, model)
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_API_BASE,
            Provider::Gemini => GEMINI_API_BASE,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

// ============================================================================
// Completion Options
// ============================================================================

/// Per-call settings for [`completion`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOptions {
    /// Overrides the provider's default base URL
    pub api_base: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// HTTP statuses that mean "try the next key"
    pub retryable_statuses: Vec<u16>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            api_base: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
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
}

// ============================================================================
// Completion
// ============================================================================

/// Run one chat completion with `credential` against the provider the model names
pub async fn completion(
    http: &Client,
    credential: &Credential,
    request: &ChatCompletionRequest,
    options: &CompletionOptions,
) -> Result<ChatCompletionResponse, ProviderError> {
    let (provider, model) = Provider::route(&request.model);
    let api_base = options
        .api_base
        .as_deref()
        .unwrap_or_else(|| provider.default_api_base());

    let mut routed = request.clone();
    routed.model = model.to_string();

    tracing::debug!(provider = %provider, model = %model, "Dispatching completion");

    match provider {
        Provider::OpenAi => {
            let client_options = ClientOptions {
                base_url: api_base.to_string(),
                organization: None,
                timeout_seconds: options.timeout_seconds,
                retryable_statuses: options.retryable_statuses.clone(),
            };
            OpenAiClient::with_http(http.clone(), credential.clone(), client_options)
                .create_chat_completion(&routed)
                .await
        }
        Provider::Gemini => {
            let (model, body) = OpenAIToGeminiConverter::new().convert_request(&routed)?;
            let response = GeminiClient::new(http.clone())
                .with_base_url(api_base)
                .with_timeout(options.timeout_seconds)
                .with_retryable_statuses(options.retryable_statuses.clone())
                .generate_content(credential, &model, &body)
                .await?;
            Ok(GeminiToOpenAIConverter::new().convert_response(&response, &model)?)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Classify;
    use crate::schemas::openai::ChatMessage;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str) -> ChatCompletionRequest {
        ChatCompletionRequest::new(model, vec![ChatMessage::user("Say hi")]).with_max_tokens(50)
    }

    #[test]
    fn test_route() {
        assert_eq!(
            Provider::route("gemini/gemini-2.0-flash"),
            (Provider::Gemini, "gemini-2.0-flash")
        );
        assert_eq!(Provider::route("openai/gpt-4o"), (Provider::OpenAi, "gpt-4o"));
        assert_eq!(Provider::route("gpt-4o-mini"), (Provider::OpenAi, "gpt-4o-mini"));
        assert_eq!(
            Provider::route("deepseek/deepseek-chat"),
            (Provider::OpenAi, "deepseek/deepseek-chat")
        );
    }

    #[test]
    fn test_default_api_base() {
        assert_eq!(Provider::OpenAi.default_api_base(), "https://api.openai.com/v1");
        assert_eq!(
            Provider::Gemini.default_api_base(),
            "https://generativelanguage.googleapis.com/v1beta"
        );
    }

    #[tokio::test]
    async fn test_openai_prefix_is_stripped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-fn"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o-mini",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = CompletionOptions::new().with_api_base(mock_server.uri());
        let response = completion(
            &Client::new(),
            &Credential::new("sk-fn"),
            &request("openai/gpt-4o-mini"),
            &options,
        )
        .await
        .unwrap();

        assert_eq!(response.first_content(), Some("Hi"));
    }

    #[tokio::test]
    async fn test_gemini_route_converts_both_ways() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "AIza-fn"))
            .and(body_partial_json(json!({"generationConfig": {"maxOutputTokens": 50}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello there"}]}, "finishReason": "MAX_TOKENS"}],
                "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 50, "totalTokenCount": 53}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = CompletionOptions::new().with_api_base(mock_server.uri());
        let response = completion(
            &Client::new(),
            &Credential::new("AIza-fn"),
            &request("gemini/gemini-2.0-flash"),
            &options,
        )
        .await
        .unwrap();

        assert_eq!(response.model, "gemini-2.0-flash");
        assert_eq!(response.first_content(), Some("Hello there"));
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("length"));
        assert_eq!(response.usage.total_tokens, 53);
    }

    #[tokio::test]
    async fn test_gemini_without_candidates_is_fatal() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
            )
            .mount(&mock_server)
            .await;

        let options = CompletionOptions::new().with_api_base(mock_server.uri());
        let err = completion(
            &Client::new(),
            &Credential::new("AIza-fn"),
            &request("gemini/gemini-2.0-flash"),
            &options,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Conversion(_)));
        assert!(!err.is_retryable());
    }
}
