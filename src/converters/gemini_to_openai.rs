//! Gemini to OpenAI format converter
//!
//! Converts Google Gemini `generateContent` responses to the OpenAI Chat
//! Completions response format.

use crate::schemas::gemini::{finish_reason, Candidate, GeminiResponse, UsageMetadata};
use crate::schemas::openai::{
    current_timestamp, generate_completion_id, AssistantMessage, ChatCompletionResponse,
    ChatRole, Choice, CompletionUsage,
};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during Gemini to OpenAI conversion
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeminiToOpenAIError {
    #[error("Missing content: {0}")]
    MissingContent(String),
}

// ============================================================================
// Converter Implementation
// ============================================================================

/// Converter for Gemini API responses to OpenAI Chat Completions API format
#[derive(Debug, Clone, Default)]
pub struct GeminiToOpenAIConverter;

impl GeminiToOpenAIConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert a Gemini response to OpenAI format
    pub fn convert_response(
        &self,
        response: &GeminiResponse,
        model: &str,
    ) -> Result<ChatCompletionResponse, GeminiToOpenAIError> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| GeminiToOpenAIError::MissingContent("No candidates".to_string()))?;

        Ok(ChatCompletionResponse {
            id: generate_completion_id(),
            object: "chat.completion".to_string(),
            created: current_timestamp(),
            model: model.to_string(),
            choices: vec![Choice {
                index: 0,
                message: self.convert_candidate_to_message(candidate),
                finish_reason: Some(
                    self.convert_finish_reason(candidate.finish_reason.as_deref())
                        .to_string(),
                ),
            }],
            usage: self.convert_usage(response.usage_metadata.as_ref()),
            system_fingerprint: None,
        })
    }

    /// Join the candidate's text parts into one assistant message
    fn convert_candidate_to_message(&self, candidate: &Candidate) -> AssistantMessage {
        let text: String = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect();

        AssistantMessage {
            role: ChatRole::Assistant,
            content: if text.is_empty() { None } else { Some(text) },
        }
    }

    /// Convert Gemini finish reason to OpenAI finish reason string
    fn convert_finish_reason(&self, reason: Option<&str>) -> &'static str {
        match reason {
            Some(finish_reason::MAX_TOKENS) => "length",
            Some(finish_reason::SAFETY) | Some(finish_reason::RECITATION) => "content_filter",
            _ => "stop",
        }
    }

    /// Convert Gemini usage to OpenAI usage
    fn convert_usage(&self, usage: Option<&UsageMetadata>) -> CompletionUsage {
        usage
            .map(|u| CompletionUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
