//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cabot_core::completion::CompletionError;
use cabot_core::retrieval::RetrievalError;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ChatResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

pub const RETRIEVAL_UNAVAILABLE_REPLY: &str =
    "The knowledge base is unavailable right now. Please try again later.";
pub const COMPLETION_UNAVAILABLE_REPLY: &str =
    "The assistant is unavailable right now. Please try again later.";
pub const INVALID_REQUEST_REPLY: &str = "Invalid request body!";

/// Application-level errors with HTTP status mapping.
///
/// Every variant renders as `{"response": "..."}`; upstream details are
/// logged, never returned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Retrieval(_) | AppError::Completion(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(detail) => {
                warn!(%detail, "rejected chat request");
                INVALID_REQUEST_REPLY
            }
            AppError::Retrieval(e) => {
                error!(error = %e, "vector store query failed");
                RETRIEVAL_UNAVAILABLE_REPLY
            }
            AppError::Completion(e) => {
                error!(error = %e, "chat completion failed");
                COMPLETION_UNAVAILABLE_REPLY
            }
        };
        (self.status(), Json(ChatResponse::new(message))).into_response()
    }
}
