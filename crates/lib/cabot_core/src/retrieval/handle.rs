//! Cached retriever handle.
//!
//! The retriever is built once (eagerly at startup or on first use) and
//! reused across requests. A query that fails with a connection-class error
//! drops the cached retriever so the next request rebuilds it.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::astra::AstraRetriever;
use super::{RetrievalError, RetrievalResult, Retriever};
use crate::config::ProviderConfig;
use crate::embedding::azure::AzureEmbedder;

/// Builds a fresh retriever.
#[async_trait]
pub trait RetrieverFactory: Send + Sync {
    async fn build(&self) -> Result<Arc<dyn Retriever>, RetrievalError>;
}

/// Factory for the Azure-embedded Astra DB retriever.
pub struct AstraRetrieverFactory {
    client: Client,
    config: ProviderConfig,
}

impl AstraRetrieverFactory {
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl RetrieverFactory for AstraRetrieverFactory {
    async fn build(&self) -> Result<Arc<dyn Retriever>, RetrievalError> {
        let embedder = Arc::new(AzureEmbedder::new(self.client.clone(), &self.config.azure));
        let retriever =
            AstraRetriever::connect(self.client.clone(), embedder, &self.config.astra).await?;
        Ok(Arc::new(retriever))
    }
}

/// Result of a query through the handle.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// No retriever could be built.
    Unavailable,
    /// The store answered; `None` means nothing matched.
    Completed(Option<RetrievalResult>),
}

/// Lazily built, shared retriever.
pub struct RetrievalHandle {
    factory: Arc<dyn RetrieverFactory>,
    cached: RwLock<Option<Arc<dyn Retriever>>>,
}

impl RetrievalHandle {
    pub fn new(factory: Arc<dyn RetrieverFactory>) -> Self {
        Self {
            factory,
            cached: RwLock::new(None),
        }
    }

    /// Return the cached retriever, building it if necessary.
    ///
    /// Returns `None` when building fails; the failure is logged and the
    /// next call tries again.
    pub async fn get(&self) -> Option<Arc<dyn Retriever>> {
        if let Some(retriever) = self.cached.read().await.as_ref() {
            return Some(Arc::clone(retriever));
        }

        let mut slot = self.cached.write().await;
        // Another request may have finished building while we waited.
        if let Some(retriever) = slot.as_ref() {
            return Some(Arc::clone(retriever));
        }

        match self.factory.build().await {
            Ok(retriever) => {
                info!("vector store handle initialized");
                *slot = Some(Arc::clone(&retriever));
                Some(retriever)
            }
            Err(e) => {
                warn!(error = %e, "vector store handle unavailable");
                None
            }
        }
    }

    /// Drop the cached retriever.
    pub async fn invalidate(&self) {
        self.cached.write().await.take();
    }

    pub async fn is_initialized(&self) -> bool {
        self.cached.read().await.is_some()
    }

    /// Query the store through the cached retriever.
    pub async fn search(&self, query: &str) -> Result<RetrievalOutcome, RetrievalError> {
        let Some(retriever) = self.get().await else {
            return Ok(RetrievalOutcome::Unavailable);
        };

        match retriever.search(query).await {
            Ok(result) => Ok(RetrievalOutcome::Completed(result)),
            Err(e) => {
                if e.is_connection_error() {
                    warn!(error = %e, "dropping vector store handle after connection failure");
                    self.invalidate().await;
                }
                Err(e)
            }
        }
    }
}
