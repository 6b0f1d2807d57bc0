//! Astra DB vector store client.
//!
//! Talks to the Data API (`/api/json/v1/{keyspace}/{collection}`): the query
//! is embedded first, then a `find` sorted by `$vector` returns the nearest
//! document together with its `$similarity`. Passage text lives in the
//! document's `content` field.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{RetrievalError, RetrievalResult, Retriever};
use crate::config::AstraConfig;
use crate::embedding::Embedder;

const DATA_API_PATH: &str = "api/json/v1";
const CONTENT_FIELD: &str = "content";

#[derive(Deserialize)]
struct DataApiError {
    message: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

#[derive(Deserialize)]
struct FindResponse {
    data: Option<FindData>,
    #[serde(default)]
    errors: Vec<DataApiError>,
}

#[derive(Deserialize)]
struct FindData {
    #[serde(default)]
    documents: Vec<Value>,
}

#[derive(Deserialize)]
struct FindCollectionsResponse {
    status: Option<FindCollectionsStatus>,
    #[serde(default)]
    errors: Vec<DataApiError>,
}

#[derive(Deserialize)]
struct FindCollectionsStatus {
    #[serde(default)]
    collections: Vec<String>,
}

/// Retriever over one Astra DB collection.
pub struct AstraRetriever {
    client: Client,
    embedder: Arc<dyn Embedder>,
    collection_url: String,
    token: String,
}

impl AstraRetriever {
    /// Connect to the configured collection.
    ///
    /// Verifies the token and that the collection exists in the keyspace
    /// before handing out a retriever.
    pub async fn connect(
        client: Client,
        embedder: Arc<dyn Embedder>,
        config: &AstraConfig,
    ) -> Result<Self, RetrievalError> {
        let keyspace_url = format!("{}/{DATA_API_PATH}/{}", config.api_endpoint, config.keyspace);

        let body = post_command(
            &client,
            &keyspace_url,
            &config.application_token,
            &json!({ "findCollections": {} }),
        )
        .await?;
        let collections = parse_collections(&body)?;

        if !collections.iter().any(|c| c == &config.collection) {
            return Err(RetrievalError::Store(format!(
                "collection '{}' not found in keyspace '{}'",
                config.collection, config.keyspace
            )));
        }

        info!(
            keyspace = %config.keyspace,
            collection = %config.collection,
            "connected to vector store"
        );

        Ok(Self {
            client,
            embedder,
            collection_url: format!("{keyspace_url}/{}", config.collection),
            token: config.application_token.clone(),
        })
    }
}

#[async_trait]
impl Retriever for AstraRetriever {
    async fn search(&self, query: &str) -> Result<Option<RetrievalResult>, RetrievalError> {
        let vector = self.embedder.embed(query).await?;
        let body = post_command(
            &self.client,
            &self.collection_url,
            &self.token,
            &find_command(&vector),
        )
        .await?;

        let result = parse_find(&body)?;
        match &result {
            Some(r) => debug!(score = r.score, chars = r.passage.len(), "retrieved passage"),
            None => debug!("no passage matched query"),
        }
        Ok(result)
    }
}

/// Top-1 vector search with similarity scores.
fn find_command(vector: &[f32]) -> Value {
    json!({
        "find": {
            "sort": { "$vector": vector },
            "projection": { "content": 1 },
            "options": { "limit": 1, "includeSimilarity": true }
        }
    })
}

async fn post_command(
    client: &Client,
    url: &str,
    token: &str,
    command: &Value,
) -> Result<Vec<u8>, RetrievalError> {
    let resp = client
        .post(url)
        .header("Token", token)
        .json(command)
        .send()
        .await
        .map_err(|e| RetrievalError::Request(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(RetrievalError::Status { status, body });
    }

    resp.bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| RetrievalError::Request(e.to_string()))
}

fn store_error(errors: &[DataApiError]) -> Option<RetrievalError> {
    let first = errors.first()?;
    let message = match (&first.error_code, &first.message) {
        (Some(code), Some(msg)) => format!("{code}: {msg}"),
        (None, Some(msg)) => msg.clone(),
        (Some(code), None) => code.clone(),
        (None, None) => "unknown error".to_string(),
    };
    Some(RetrievalError::Store(message))
}

fn parse_collections(body: &[u8]) -> Result<Vec<String>, RetrievalError> {
    let resp: FindCollectionsResponse =
        serde_json::from_slice(body).map_err(|e| RetrievalError::Parse(e.to_string()))?;
    if let Some(err) = store_error(&resp.errors) {
        return Err(err);
    }
    Ok(resp.status.map(|s| s.collections).unwrap_or_default())
}

fn parse_find(body: &[u8]) -> Result<Option<RetrievalResult>, RetrievalError> {
    let resp: FindResponse =
        serde_json::from_slice(body).map_err(|e| RetrievalError::Parse(e.to_string()))?;
    if let Some(err) = store_error(&resp.errors) {
        return Err(err);
    }

    let Some(doc) = resp.data.and_then(|d| d.documents.into_iter().next()) else {
        return Ok(None);
    };

    let passage = match doc.get(CONTENT_FIELD).and_then(Value::as_str) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => return Ok(None),
    };
    let score = doc
        .get("$similarity")
        .and_then(Value::as_f64)
        .ok_or_else(|| RetrievalError::Parse("document is missing $similarity".into()))?;

    Ok(Some(RetrievalResult { passage, score }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_command_requests_single_scored_match() {
        let cmd = find_command(&[0.5, -0.25]);
        assert_eq!(cmd["find"]["sort"]["$vector"], json!([0.5, -0.25]));
        assert_eq!(cmd["find"]["options"]["limit"], 1);
        assert_eq!(cmd["find"]["options"]["includeSimilarity"], true);
        assert_eq!(cmd["find"]["projection"]["content"], 1);
    }

    #[test]
    fn parses_top_document() {
        let body = br#"{"data":{"documents":[{"_id":"a1","content":"GST on services is 18%.","$similarity":0.93}],"nextPageState":null}}"#;
        let result = parse_find(body).unwrap().unwrap();
        assert_eq!(result.passage, "GST on services is 18%.");
        assert!((result.score - 0.93).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_documents_means_no_match() {
        let body = br#"{"data":{"documents":[],"nextPageState":null}}"#;
        assert!(parse_find(body).unwrap().is_none());
    }

    #[test]
    fn document_without_content_means_no_match() {
        let body = br#"{"data":{"documents":[{"_id":"a1","$similarity":0.8}]}}"#;
        assert!(parse_find(body).unwrap().is_none());
    }

    #[test]
    fn api_errors_are_surfaced() {
        let body = br#"{"errors":[{"message":"Collection does not exist","errorCode":"COLLECTION_NOT_EXIST"}]}"#;
        match parse_find(body) {
            Err(RetrievalError::Store(msg)) => {
                assert_eq!(msg, "COLLECTION_NOT_EXIST: Collection does not exist")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_similarity_is_a_parse_error() {
        let body = br#"{"data":{"documents":[{"content":"text"}]}}"#;
        assert!(matches!(parse_find(body), Err(RetrievalError::Parse(_))));
    }

    #[test]
    fn parses_collection_listing() {
        let body = br#"{"status":{"collections":["tax_docs","other"]}}"#;
        assert_eq!(parse_collections(body).unwrap(), vec!["tax_docs", "other"]);
    }
}
