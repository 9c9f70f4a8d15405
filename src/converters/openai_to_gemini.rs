//! OpenAI to Gemini format converter
//!
//! Turns an OpenAI Chat Completions request into a Gemini `generateContent`
//! body. Text only.

use crate::schemas::gemini::{GenerationConfig, GeminiContent, GeminiRequest, Part};
use crate::schemas::openai::{ChatCompletionRequest, ChatMessage, ChatRole};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during OpenAI to Gemini conversion
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpenAIToGeminiError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

// ============================================================================
// Converter Implementation
// ============================================================================

/// Converter for OpenAI Chat Completions API requests to Gemini API format
#[derive(Debug, Clone, Default)]
pub struct OpenAIToGeminiConverter;

impl OpenAIToGeminiConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert an OpenAI request to Gemini format
    ///
    /// Returns the model ID together with the request body, since Gemini
    /// carries the model in the URL rather than the body.
    pub fn convert_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<(String, GeminiRequest), OpenAIToGeminiError> {
        if request.model.trim().is_empty() {
            return Err(OpenAIToGeminiError::MissingField("model".to_string()));
        }

        let (system_messages, chat_messages): (Vec<&ChatMessage>, Vec<&ChatMessage>) = request
            .messages
            .iter()
            .partition(|m| m.role == ChatRole::System);

        let contents: Vec<GeminiContent> = chat_messages
            .iter()
            .filter_map(|m| self.convert_message(m))
            .collect();

        if contents.is_empty() {
            return Err(OpenAIToGeminiError::InvalidMessage(
                "at least one non-empty user or assistant message is required".to_string(),
            ));
        }

        let generation_config = self.convert_generation_config(request);

        let gemini_request = GeminiRequest {
            contents,
            system_instruction: self.convert_system_messages(&system_messages),
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
        };

        Ok((request.model.clone(), gemini_request))
    }

    /// Convert a single user/assistant message, skipping empty ones
    fn convert_message(&self, message: &ChatMessage) -> Option<GeminiContent> {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
            ChatRole::System => return None,
        };

        let text = message.text_content();
        if text.is_empty() {
            return None;
        }

        Some(GeminiContent {
            role: Some(role.to_string()),
            parts: vec![Part::text(text)],
        })
    }

    /// Join system messages into a single system instruction
    fn convert_system_messages(&self, messages: &[&ChatMessage]) -> Option<GeminiContent> {
        let text = messages
            .iter()
            .map(|m| m.text_content())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            None
        } else {
            Some(GeminiContent::system(text))
        }
    }

    /// Convert generation parameters
    fn convert_generation_config(&self, request: &ChatCompletionRequest) -> GenerationConfig {
        GenerationConfig {
            temperature: request.temperature,
            top_p: request.top_p,
            max_output_tokens: request.max_tokens,
            stop_sequences: request.stop.as_ref().map(|s| s.to_vec()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
