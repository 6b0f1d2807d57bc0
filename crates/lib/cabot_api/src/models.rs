//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Form body of `POST /chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub user_message: Option<String>,
}

/// JSON body of every `POST /chat` response, errors included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}
