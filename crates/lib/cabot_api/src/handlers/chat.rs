//! Chat request handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, response::IntoResponse};
use axum_extra::extract::SignedCookieJar;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{ChatRequest, ChatResponse};
use crate::services::{chat, session};

const MESSAGE_FIELD: &str = "user_message";

/// `user_message` read from a urlencoded or multipart form body.
///
/// A request with neither a content type nor a body carries no message and
/// yields an empty [`ChatRequest`].
pub struct ChatForm(pub ChatRequest);

impl<S> FromRequest<S> for ChatForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                read_multipart(multipart).await.map(Self)
            }
            Some(_) => {
                let Form(request) = Form::<ChatRequest>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                Ok(Self(request))
            }
            None => {
                let body = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                if body.is_empty() {
                    Ok(Self(ChatRequest::default()))
                } else {
                    Err(AppError::Validation("body without a content type".into()))
                }
            }
        }
    }
}

/// First `user_message` part wins; other parts are ignored.
async fn read_multipart(mut multipart: Multipart) -> AppResult<ChatRequest> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() == Some(MESSAGE_FIELD) {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(ChatRequest {
                user_message: Some(text),
            });
        }
    }
    Ok(ChatRequest::default())
}

/// `POST /chat`: answer one `user_message`.
pub async fn chat_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ChatForm(request): ChatForm,
) -> AppResult<impl IntoResponse> {
    let (jar, session_id) = session::resolve(jar);

    let reply = chat::reply(&state, session_id, request.user_message.as_deref()).await?;

    Ok((jar, Json(ChatResponse::new(reply))))
}
