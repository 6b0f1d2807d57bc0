//! Embedding module: turns query text into a vector for similarity search.
//!
//! # Providers
//!
//! - [`azure::AzureEmbedder`]: Azure OpenAI embeddings deployment
//!   (`text-embedding-ada-002` by default)

pub mod azure;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Embedding response parse error: {0}")]
    Parse(String),

    #[error("Embedding service returned no vectors")]
    Empty,
}

/// Produces an embedding vector for a single text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
