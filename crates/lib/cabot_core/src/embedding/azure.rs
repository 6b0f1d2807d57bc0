//! Azure OpenAI embedding provider.
//!
//! Calls `{endpoint}/openai/deployments/{deployment}/embeddings` with the
//! `api-key` header. Single attempt, no retry.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Embedder, EmbeddingError};
use crate::config::AzureOpenAiConfig;

#[derive(Serialize)]
struct AzureEmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct AzureEmbeddingResponse {
    data: Vec<AzureEmbedding>,
}

#[derive(Deserialize)]
struct AzureEmbedding {
    embedding: Vec<f64>,
}

/// Embedder backed by an Azure OpenAI embeddings deployment.
pub struct AzureEmbedder {
    client: Client,
    url: String,
    api_key: String,
    api_version: String,
}

impl AzureEmbedder {
    pub fn new(client: Client, config: &AzureOpenAiConfig) -> Self {
        Self {
            client,
            url: embeddings_url(&config.endpoint, &config.embedding_deployment),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
        }
    }
}

fn embeddings_url(endpoint: &str, deployment: &str) -> String {
    format!("{endpoint}/openai/deployments/{deployment}/embeddings")
}

fn parse_response(body: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
    let data: AzureEmbeddingResponse =
        serde_json::from_slice(body).map_err(|e| EmbeddingError::Parse(e.to_string()))?;

    let embedding = data.data.into_iter().next().ok_or(EmbeddingError::Empty)?;
    Ok(embedding.embedding.into_iter().map(|v| v as f32).collect())
}

#[async_trait]
impl Embedder for AzureEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let resp = self
            .client
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&AzureEmbeddingRequest { input: text })
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(EmbeddingError::Status { status, body });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;
        parse_response(&body)
    }
}
