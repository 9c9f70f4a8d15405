//! Named targets and their adapter shape

use super::client::RotatingClient;
use super::function::RotatingCompletion;
use crate::config::TargetConfig;
use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::services::key_pool::CredentialPool;
use crate::services::providers::{ClientOptions, CompletionOptions, ProviderError};
use crate::services::rotation::ExecutionEngine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Target Kind
// ============================================================================

/// Which adapter shape a target uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// OpenAI-compatible client, rebuilt per key
    #[serde(rename = "openai-like", alias = "openai", alias = "client")]
    StatefulClient,

    /// Provider-routing `completion` function, key passed per call
    #[serde(rename = "function-like", alias = "litellm", alias = "function")]
    StatelessFunction,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::StatefulClient => "openai-like",
            TargetKind::StatelessFunction => "function-like",
        }
    }

    /// Infer the kind from a target name such as `openai` or `litellm`
    pub fn infer_from_name(name: &str) -> Result<Self, ProviderError> {
        name.parse()
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai-like" | "openai" | "client" => Ok(TargetKind::StatefulClient),
            "function-like" | "litellm" | "function" => Ok(TargetKind::StatelessFunction),
            _ => Err(ProviderError::UnsupportedTarget(s.to_string())),
        }
    }
}

// ============================================================================
// Rotating Target
// ============================================================================

/// A configured target, dispatched by its kind
#[derive(Debug, Clone)]
pub enum RotatingTarget {
    Client(RotatingClient),
    Function(RotatingCompletion),
}

impl RotatingTarget {
    /// Build the adapter a target config asks for
    pub fn from_config(
        name: &str,
        config: &TargetConfig,
        engine: ExecutionEngine,
    ) -> Result<Self, ProviderError> {
        let target = match config.resolved_kind(name)? {
            TargetKind::StatefulClient => {
                let mut options = ClientOptions::new()
                    .with_timeout(config.timeout_seconds)
                    .with_retryable_statuses(config.retry_on_status.clone());
                if let Some(base_url) = &config.base_url {
                    options = options.with_base_url(base_url);
                }
                if let Some(organization) = &config.organization {
                    options = options.with_organization(organization);
                }
                RotatingTarget::Client(
                    RotatingClient::new(config.api_keys.clone(), options).with_engine(engine),
                )
            }
            TargetKind::StatelessFunction => {
                let options = CompletionOptions {
                    api_base: config.base_url.clone(),
                    timeout_seconds: config.timeout_seconds,
                    retryable_statuses: config.retry_on_status.clone(),
                };
                RotatingTarget::Function(
                    RotatingCompletion::new(config.api_keys.clone(), options)?.with_engine(engine),
                )
            }
        };

        tracing::debug!(
            target_name = %name,
            kind = %target.kind(),
            keys = target.pool().len(),
            "Built rotating target"
        );

        Ok(target)
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            RotatingTarget::Client(_) => TargetKind::StatefulClient,
            RotatingTarget::Function(_) => TargetKind::StatelessFunction,
        }
    }

    pub fn pool(&self) -> &CredentialPool {
        match self {
            RotatingTarget::Client(client) => client.pool(),
            RotatingTarget::Function(function) => function.pool(),
        }
    }

    /// Send a chat request through whichever adapter this target uses
    pub async fn chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        match self {
            RotatingTarget::Client(client) => client.create_chat_completion(request).await,
            RotatingTarget::Function(function) => function.complete(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::openai::ChatMessage;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target_config(value: serde_json::Value) -> TargetConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_target_kind_parsing() {
        assert_eq!("openai-like".parse::<TargetKind>().unwrap(), TargetKind::StatefulClient);
        assert_eq!("OpenAI".parse::<TargetKind>().unwrap(), TargetKind::StatefulClient);
        assert_eq!("client".parse::<TargetKind>().unwrap(), TargetKind::StatefulClient);
        assert_eq!("litellm".parse::<TargetKind>().unwrap(), TargetKind::StatelessFunction);
        assert_eq!("function-like".parse::<TargetKind>().unwrap(), TargetKind::StatelessFunction);

        let err = "anthropic".parse::<TargetKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported target: anthropic");
    }

    #[test]
    fn test_target_kind_serde() {
        assert_eq!(
            serde_json::to_string(&TargetKind::StatefulClient).unwrap(),
            r#""openai-like""#
        );
        assert_eq!(
            serde_json::from_str::<TargetKind>(r#""litellm""#).unwrap(),
            TargetKind::StatelessFunction
        );
        assert!(serde_json::from_str::<TargetKind>(r#""bedrock""#).is_err());
    }

    #[test]
    fn test_from_config_infers_kind_from_name() {
        let config = target_config(json!({"model": "gpt-4o-mini", "api_keys": ["sk-a", "sk-b"]}));

        let target = RotatingTarget::from_config("openai", &config, ExecutionEngine::new()).unwrap();
        assert_eq!(target.kind(), TargetKind::StatefulClient);
        assert_eq!(target.pool().len(), 2);

        let target = RotatingTarget::from_config("litellm", &config, ExecutionEngine::new()).unwrap();
        assert_eq!(target.kind(), TargetKind::StatelessFunction);
    }

    #[test]
    fn test_from_config_explicit_kind_wins() {
        let config = target_config(json!({
            "kind": "function-like",
            "model": "gemini/gemini-2.0-flash",
            "api_keys": "AIza-1"
        }));

        let target = RotatingTarget::from_config("openai", &config, ExecutionEngine::new()).unwrap();
        assert_eq!(target.kind(), TargetKind::StatelessFunction);
    }

    #[test]
    fn test_from_config_unknown_name_without_kind() {
        let config = target_config(json!({"model": "m", "api_keys": "k"}));

        let err = RotatingTarget::from_config("mystery", &config, ExecutionEngine::new()).unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedTarget(name) if name == "mystery"));
    }

    #[tokio::test]
    async fn test_chat_through_client_target() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o-mini",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = target_config(json!({
            "base_url": format!("{}/v1", mock_server.uri()),
            "model": "gpt-4o-mini",
            "api_keys": "sk-live"
        }));
        let target = RotatingTarget::from_config("openai", &config, ExecutionEngine::new()).unwrap();

        let request = ChatCompletionRequest::new(config.model.clone(), vec![ChatMessage::user("Say hi")]);
        let response = target.chat(&request).await.unwrap();
        assert_eq!(response.first_content(), Some("Hi"));
    }
}
