//! Provider configuration resolved from environment variables.
//!
//! Covers the Azure OpenAI deployment (chat + embeddings) and the Astra DB
//! collection used for retrieval. Validation is presence-only, plus a URL
//! shape check on the two endpoints.

use std::env;

use thiserror::Error;

/// Default Azure OpenAI REST API version.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";
/// Default chat completion deployment.
pub const DEFAULT_CHAT_DEPLOYMENT: &str = "gpt4";
/// Default embedding deployment.
pub const DEFAULT_EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";
/// Default Astra DB keyspace.
pub const DEFAULT_KEYSPACE: &str = "default_keyspace";

/// Errors raised while resolving configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid URL in {var}: {reason}")]
    InvalidUrl { var: String, reason: String },
}

/// Azure OpenAI connection settings.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub chat_deployment: String,
    pub embedding_deployment: String,
}

impl std::fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("chat_deployment", &self.chat_deployment)
            .field("embedding_deployment", &self.embedding_deployment)
            .finish()
    }
}

/// Astra DB Data API settings.
#[derive(Clone)]
pub struct AstraConfig {
    pub application_token: String,
    /// Database id. Informational only, the API endpoint already encodes it.
    pub database_id: String,
    pub api_endpoint: String,
    pub keyspace: String,
    pub collection: String,
}

impl std::fmt::Debug for AstraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AstraConfig")
            .field("application_token", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("api_endpoint", &self.api_endpoint)
            .field("keyspace", &self.keyspace)
            .field("collection", &self.collection)
            .finish()
    }
}

/// All external provider settings.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub azure: AzureOpenAiConfig,
    pub astra: AstraConfig,
}

impl ProviderConfig {
    /// Reads provider configuration from the process environment.
    ///
    /// | Variable                            | Default                  |
    /// |-------------------------------------|--------------------------|
    /// | `AZURE_OPENAI_ENDPOINT`             | required                 |
    /// | `AZURE_OPENAI_KEY`                  | required                 |
    /// | `AZURE_OPENAI_API_VERSION`          | `2024-02-15-preview`     |
    /// | `AZURE_OPENAI_CHAT_DEPLOYMENT`      | `gpt4`                   |
    /// | `AZURE_OPENAI_EMBEDDING_DEPLOYMENT` | `text-embedding-ada-002` |
    /// | `ASTRA_DB_APPLICATION_TOKEN`        | required                 |
    /// | `ASTRA_DB_ID`                       | required                 |
    /// | `ASTRA_DB_API_ENDPOINT`             | required                 |
    /// | `ASTRA_DB_COLLECTION_NAME`          | required                 |
    /// | `ASTRA_DB_KEYSPACE`                 | `default_keyspace`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary lookup function.
    ///
    /// Empty values are treated as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::Missing(key.to_string()));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let endpoint = required("AZURE_OPENAI_ENDPOINT")?;
        check_url("AZURE_OPENAI_ENDPOINT", &endpoint)?;
        let api_endpoint = required("ASTRA_DB_API_ENDPOINT")?;
        check_url("ASTRA_DB_API_ENDPOINT", &api_endpoint)?;

        Ok(Self {
            azure: AzureOpenAiConfig {
                endpoint: trim_base(&endpoint),
                api_key: required("AZURE_OPENAI_KEY")?,
                api_version: or_default("AZURE_OPENAI_API_VERSION", DEFAULT_API_VERSION),
                chat_deployment: or_default(
                    "AZURE_OPENAI_CHAT_DEPLOYMENT",
                    DEFAULT_CHAT_DEPLOYMENT,
                ),
                embedding_deployment: or_default(
                    "AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
                    DEFAULT_EMBEDDING_DEPLOYMENT,
                ),
            },
            astra: AstraConfig {
                application_token: required("ASTRA_DB_APPLICATION_TOKEN")?,
                database_id: required("ASTRA_DB_ID")?,
                api_endpoint: trim_base(&api_endpoint),
                keyspace: or_default("ASTRA_DB_KEYSPACE", DEFAULT_KEYSPACE),
                collection: required("ASTRA_DB_COLLECTION_NAME")?,
            },
        })
    }
}

fn check_url(var: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        var: var.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            var: var.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(())
}

/// Strip trailing slashes so paths can be appended with `format!`.
fn trim_base(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}
