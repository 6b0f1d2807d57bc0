//! Azure OpenAI chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatCompleter, CompletionError, CompletionParams};
use crate::config::AzureOpenAiConfig;
use crate::conversation::ConversationTurn;

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ConversationTurn],
    #[serde(flatten)]
    params: &'a CompletionParams,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Completer backed by an Azure OpenAI chat deployment.
pub struct AzureChatCompleter {
    client: Client,
    url: String,
    api_key: String,
    api_version: String,
    params: CompletionParams,
}

impl AzureChatCompleter {
    pub fn new(client: Client, config: &AzureOpenAiConfig) -> Self {
        Self::with_params(client, config, CompletionParams::default())
    }

    pub fn with_params(
        client: Client,
        config: &AzureOpenAiConfig,
        params: CompletionParams,
    ) -> Self {
        Self {
            client,
            url: completions_url(&config.endpoint, &config.chat_deployment),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            params,
        }
    }
}

fn completions_url(endpoint: &str, deployment: &str) -> String {
    format!("{endpoint}/openai/deployments/{deployment}/chat/completions")
}

fn parse_response(body: &[u8]) -> Result<String, CompletionError> {
    let data: ChatResponse =
        serde_json::from_slice(body).map_err(|e| CompletionError::Parse(e.to_string()))?;

    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or(CompletionError::EmptyChoices)?;

    choice
        .message
        .content
        .ok_or_else(|| CompletionError::Parse("first choice has no content".into()))
}

#[async_trait]
impl ChatCompleter for AzureChatCompleter {
    async fn complete(&self, messages: &[ConversationTurn]) -> Result<String, CompletionError> {
        debug!(messages = messages.len(), "requesting chat completion");

        let resp = self
            .client
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&ChatRequest {
                messages,
                params: &self.params,
            })
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(CompletionError::Status { status, body });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn url_targets_chat_deployment() {
        assert_eq!(
            completions_url("https://res.openai.azure.com", "gpt4"),
            "https://res.openai.azure.com/openai/deployments/gpt4/chat/completions"
        );
    }

    #[test]
    fn request_carries_history_and_fixed_params() {
        let messages = vec![
            ConversationTurn::user("earlier prompt"),
            ConversationTurn::assistant("earlier reply"),
            ConversationTurn::user("new prompt"),
        ];
        let params = CompletionParams::default();
        let body = serde_json::to_value(ChatRequest {
            messages: &messages,
            params: &params,
        })
        .unwrap();

        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1], json!({"role": "assistant", "content": "earlier reply"}));
        assert_eq!(body["max_tokens"], 1800);
        assert_eq!(body["frequency_penalty"], 0.0);
        assert_eq!(body["presence_penalty"], 0.0);
        assert!(body["stop"].is_null());
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((body["top_p"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn parses_first_choice_content() {
        let body = br#"{"id":"c1","choices":[{"index":0,"finish_reason":"stop","message":{"role":"assistant","content":"Deduction is 1.5 lakh."}},{"index":1,"message":{"role":"assistant","content":"other"}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Deduction is 1.5 lakh.");
    }

    #[test]
    fn empty_choices_is_an_error() {
        assert!(matches!(
            parse_response(br#"{"choices":[]}"#),
            Err(CompletionError::EmptyChoices)
        ));
    }

    #[test]
    fn filtered_choice_without_content_is_a_parse_error() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"content_filter"}]}"#;
        assert!(matches!(parse_response(body), Err(CompletionError::Parse(_))));
    }
}
