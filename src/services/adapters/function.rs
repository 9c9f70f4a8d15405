//! Stateless-function adapter
//!
//! Wraps the provider-routing [`completion`] function. The key is injected
//! as an argument on each attempt, and the HTTP connection pool is shared
//! across attempts.

use crate::schemas::openai::{ChatCompletionRequest, ChatCompletionResponse};
use crate::services::key_pool::{Credential, CredentialPool};
use crate::services::providers::{build_client, completion, CompletionOptions, ProviderError};
use crate::services::rotation::{CallInvoker, ExecutionEngine, ExecutionReport};
use async_trait::async_trait;
use reqwest::Client;

/// One `completion` call, replayable against any credential
#[derive(Debug)]
pub struct FunctionInvoker<'a> {
    http: &'a Client,
    options: &'a CompletionOptions,
    request: &'a ChatCompletionRequest,
}

impl<'a> FunctionInvoker<'a> {
    pub fn new(
        http: &'a Client,
        options: &'a CompletionOptions,
        request: &'a ChatCompletionRequest,
    ) -> Self {
        Self {
            http,
            options,
            request,
        }
    }
}

#[async_trait]
impl CallInvoker for FunctionInvoker<'_> {
    type Output = ChatCompletionResponse;
    type Error = ProviderError;

    async fn invoke(&self, credential: &Credential) -> Result<ChatCompletionResponse, ProviderError> {
        completion(self.http, credential, self.request, self.options).await
    }
}

/// `completion` bound to a pool of keys
#[derive(Debug, Clone)]
pub struct RotatingCompletion {
    pool: CredentialPool,
    options: CompletionOptions,
    http: Client,
    engine: ExecutionEngine,
}

impl RotatingCompletion {
    pub fn new(pool: CredentialPool, options: CompletionOptions) -> Result<Self, ProviderError> {
        let http = build_client(options.timeout_seconds)?;
        Ok(Self {
            pool,
            options,
            http,
            engine: ExecutionEngine::new(),
        })
    }

    /// Use a configured engine (observer, mask prefix) instead of the silent default
    pub fn with_engine(mut self, engine: ExecutionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Run the completion, trying each key in order
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        self.complete_with_report(request).await.result
    }

    /// Same as [`complete`](Self::complete), with the attempt log
    pub async fn complete_with_report(
        &self,
        request: &ChatCompletionRequest,
    ) -> ExecutionReport<ChatCompletionResponse, ProviderError> {
        tracing::debug!(
            model = %request.model,
            keys = self.pool.len(),
            "Dispatching completion through rotating function"
        );

        let invoker = FunctionInvoker::new(&self.http, &self.options, request);
        self.engine.execute_with_report(&self.pool, &invoker).await
    }
}
