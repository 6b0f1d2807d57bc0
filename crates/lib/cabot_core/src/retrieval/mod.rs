//! Retrieval module: top-1 passage lookup against the vector store.
//!
//! # Public API
//!
//! - [`Retriever`]: query interface implemented by vector store clients
//! - [`astra::AstraRetriever`]: Astra DB Data API collection
//! - [`handle::RetrievalHandle`]: cached, lazily (re)built retriever

pub mod astra;
pub mod handle;

use async_trait::async_trait;
use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Closest stored passage and its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub passage: String,
    pub score: f64,
}

/// Errors that can occur while querying the vector store.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store request failed: {0}")]
    Request(String),

    #[error("Vector store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Vector store response parse error: {0}")]
    Parse(String),

    #[error("Vector store error: {0}")]
    Store(String),
}

impl RetrievalError {
    /// Whether the error points at a broken connection or rejected
    /// credentials, in which case the cached handle should be rebuilt.
    pub fn is_connection_error(&self) -> bool {
        match self {
            RetrievalError::Request(_)
            | RetrievalError::Embedding(EmbeddingError::Request(_)) => true,
            RetrievalError::Status { status, .. }
            | RetrievalError::Embedding(EmbeddingError::Status { status, .. }) => {
                matches!(*status, 401 | 403)
            }
            _ => false,
        }
    }
}

/// Vector store query interface.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return the single most similar passage, or `None` if the store has
    /// nothing to offer.
    async fn search(&self, query: &str) -> Result<Option<RetrievalResult>, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_invalidate_handle() {
        assert!(RetrievalError::Request("connection refused".into()).is_connection_error());
        assert!(
            RetrievalError::Embedding(EmbeddingError::Request("dns".into())).is_connection_error()
        );
    }

    #[test]
    fn auth_failures_invalidate_handle() {
        let err = RetrievalError::Status {
            status: 401,
            body: "bad token".into(),
        };
        assert!(err.is_connection_error());

        let err = RetrievalError::Embedding(EmbeddingError::Status {
            status: 403,
            body: String::new(),
        });
        assert!(err.is_connection_error());
    }

    #[test]
    fn data_errors_keep_handle() {
        assert!(!RetrievalError::Parse("eof".into()).is_connection_error());
        assert!(!RetrievalError::Store("bad sort".into()).is_connection_error());
        let err = RetrievalError::Status {
            status: 500,
            body: String::new(),
        };
        assert!(!err.is_connection_error());
    }
}
