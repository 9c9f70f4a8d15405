//! OpenAI-compatible chat client
//!
//! A client instance is bound to exactly one credential. Rotating means
//! building a new client for the next key, which is what the stateful-client
//! adapter does on every attempt.

use super::error::{ProviderError, DEFAULT_RETRYABLE_STATUSES};
use super::http::{build_client, join_url, send_json};
use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::services::key_pool::Credential;
use reqwest::Client;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Client Options
// ============================================================================

/// Everything needed to build a client except the credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,

    /// Sent as `OpenAI-Organization` when set
    pub organization: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// HTTP statuses that mean "try the next key"
    pub retryable_statuses: Vec<u16>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: OPENAI_API_BASE.to_string(),
            organization: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
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
// OpenAI Client
// ============================================================================

/// Chat Completions client bound to a single API key
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    credential: Credential,
    options: ClientOptions,
}

impl OpenAiClient {
    /// Create a client with its own HTTP connection pool
    pub fn new(credential: Credential, options: ClientOptions) -> Result<Self, ProviderError> {
        let http = build_client(options.timeout_seconds)?;
        Ok(Self::with_http(http, credential, options))
    }

    /// Create a client on top of an existing HTTP client
    pub fn with_http(http: Client, credential: Credential, options: ClientOptions) -> Self {
        Self {
            http,
            credential,
            options,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// POST `{base_url}/chat/completions`
    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let url = join_url(&self.options.base_url, "chat/completions");

        tracing::debug!(
            model = %request.model,
            url = %url,
            "Calling OpenAI chat completions API"
        );

        let mut builder = self
            .http
            .post(&url)
            .bearer_auth(self.credential.expose())
            .timeout(Duration::from_secs(self.options.timeout_seconds))
            .json(request);

        if let Some(organization) = &self.options.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }

        send_json(builder, &self.options.retryable_statuses).await
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

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-abc123",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
        })
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest::new("gpt-4o-mini", vec![ChatMessage::user("Say hi")]).with_max_tokens(50)
    }

    #[test]
    fn test_client_options_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.base_url, "https://api.openai.com/v1");
        assert_eq!(options.organization, None);
        assert_eq!(options.timeout_seconds, 120);
        assert_eq!(options.retryable_statuses, vec![429]);
    }

    #[tokio::test]
    async fn test_create_chat_completion_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(header("openai-organization", "org-123"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini", "max_tokens": 50})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hi!")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = ClientOptions::new()
            .with_base_url(format!("{}/v1", mock_server.uri()))
            .with_organization("org-123");
        let client = OpenAiClient::new(Credential::new("sk-test-key"), options).unwrap();

        let response = client.create_chat_completion(&request()).await.unwrap();

        assert_eq!(response.id, "chatcmpl-abc123");
        assert_eq!(response.first_content(), Some("Hi!"));
        assert_eq!(response.usage.total_tokens, 7);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded"}
            })))
            .mount(&mock_server)
            .await;

        let client = OpenAiClient::new(
            Credential::new("sk-test-key"),
            ClientOptions::new().with_base_url(mock_server.uri()),
        )
        .unwrap();

        let err = client.create_chat_completion(&request()).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "API error: 429 - Rate limit reached");
    }

    #[tokio::test]
    async fn test_auth_error_is_fatal() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let client = OpenAiClient::new(
            Credential::new("sk-bad"),
            ClientOptions::new().with_base_url(mock_server.uri()),
        )
        .unwrap();

        let err = client.create_chat_completion(&request()).await.unwrap_err();

        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "API error: 401 - Unauthorized");
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = OpenAiClient::new(
            Credential::new("sk-test-key"),
            ClientOptions::new().with_base_url(mock_server.uri()),
        )
        .unwrap();

        let err = client.create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }
}
