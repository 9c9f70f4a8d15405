//! Stateful-client adapter
//!
//! Behaves like an OpenAI client that owns a whole pool of keys. Every
//! attempt builds a fresh [`OpenAiClient`] bound to the candidate key, so no
//! client state leaks from one key to the next.

use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::services::key_pool::{Credential, CredentialPool};
use crate::services::providers::{ClientOptions, OpenAiClient, ProviderError};
use crate::services::rotation::{CallInvoker, ExecutionEngine, ExecutionReport};
use async_trait::async_trait;

/// One chat completion, replayable against any credential
#[derive(Debug)]
pub struct ClientInvoker<'a> {
    options: &'a ClientOptions,
    request: &'a ChatCompletionRequest,
}

impl<'a> ClientInvoker<'a> {
    pub fn new(options: &'a ClientOptions, request: &'a ChatCompletionRequest) -> Self {
        Self { options, request }
    }
}

#[async_trait]
impl CallInvoker for ClientInvoker<'_> {
    type Output = ChatCompletionResponse;
    type Error = ProviderError;

    async fn invoke(&self, credential: &Credential) -> Result<ChatCompletionResponse, ProviderError> {
        OpenAiClient::new(credential.clone(), self.options.clone())?
            .create_chat_completion(self.request)
            .await
    }
}

/// OpenAI-compatible client that switches keys on retryable failures
#[derive(Debug, Clone)]
pub struct RotatingClient {
    pool: CredentialPool,
    options: ClientOptions,
    engine: ExecutionEngine,
}

impl RotatingClient {
    pub fn new(pool: CredentialPool, options: ClientOptions) -> Self {
        Self {
            pool,
            options,
            engine: ExecutionEngine::new(),
        }
    }

    /// Use a configured engine (observer, mask prefix) instead of the silent default
    pub fn with_engine(mut self, engine: ExecutionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Create a chat completion, trying each key in order
    pub async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        self.create_chat_completion_with_report(request).await.result
    }

    /// Same as [`create_chat_completion`](Self::create_chat_completion), with the attempt log
    pub async fn create_chat_completion_with_report(
        &self,
        request: &ChatCompletionRequest,
    ) -> ExecutionReport<ChatCompletionResponse, ProviderError> {
        tracing::debug!(
            model = %request.model,
            keys = self.pool.len(),
            "Dispatching chat completion through rotating client"
        );

        let invoker = ClientInvoker::new(&self.options, request);
        self.engine.execute_with_report(&self.pool, &invoker).await
    }
}
