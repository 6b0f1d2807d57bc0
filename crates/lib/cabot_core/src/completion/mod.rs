//! Chat completion module.
//!
//! - [`ChatCompleter`]: sends a message list, returns the top reply text
//! - [`CompletionParams`]: fixed sampling parameters
//! - [`azure::AzureChatCompleter`]: Azure OpenAI chat completions

pub mod azure;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::conversation::ConversationTurn;

/// Errors that can occur while requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion response parse error: {0}")]
    Parse(String),

    #[error("Completion service returned no choices")]
    EmptyChoices,
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Option<Vec<String>>,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1800,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: None,
        }
    }
}

/// Completion service interface.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Returns the content of the first choice.
    async fn complete(&self, messages: &[ConversationTurn]) -> Result<String, CompletionError>;
}
