//! # cabot_api
//!
//! HTTP API library for CA Bot.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, post};
use axum_extra::extract::cookie::Key;
use cabot_core::completion::ChatCompleter;
use cabot_core::conversation::SessionStore;
use cabot_core::retrieval::handle::RetrievalHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{chat, index};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Per-session conversation logs.
    pub sessions: Arc<SessionStore>,
    /// Cached vector store retriever.
    pub retrieval: Arc<RetrievalHandle>,
    /// Chat completion client.
    pub completer: Arc<dyn ChatCompleter>,
    /// Signing key for the session cookie.
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        retrieval: Arc<RetrievalHandle>,
        completer: Arc<dyn ChatCompleter>,
    ) -> Self {
        let cookie_key = services::session::cookie_key(&config.session_secret);
        Self {
            config,
            sessions: Arc::new(SessionStore::new()),
            retrieval,
            completer,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index::index_handler))
        .route("/chat", post(chat::chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
