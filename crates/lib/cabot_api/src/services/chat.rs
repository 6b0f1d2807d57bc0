//! Chat turn orchestration: parse → greeting check → retrieve → prompt →
//! complete → record.

use cabot_core::prompt::build_prompt;
use cabot_core::retrieval::handle::RetrievalOutcome;
use tracing::{debug, info};
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;

/// Messages answered with [`GREETING_REPLY`] (compared after lower-casing).
pub const GREETINGS: [&str; 5] = ["hi", "hello", "hey", "hola", "howdy"];

pub const GREETING_REPLY: &str =
    "Hello! How can I assist you with your accounting or tax-related questions today?";
pub const EMPTY_MESSAGE_REPLY: &str = "Please provide a message!";
pub const NOT_INITIALIZED_REPLY: &str = "Vector store is not initialized!";

/// Lower-case the raw message; `None` when missing or empty.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    raw.filter(|m| !m.is_empty()).map(str::to_lowercase)
}

/// Exact match against [`GREETINGS`]. A greeting inside a longer sentence
/// does not count.
pub fn is_greeting(message: &str) -> bool {
    GREETINGS.contains(&message)
}

/// Produce the reply for one chat message in `session`.
///
/// Only a completed exchange touches the session log, and it always adds
/// exactly the prompt turn followed by the reply turn.
pub async fn reply(state: &AppState, session: Uuid, raw: Option<&str>) -> AppResult<String> {
    let Some(message) = normalize(raw) else {
        return Ok(EMPTY_MESSAGE_REPLY.to_string());
    };

    if is_greeting(&message) {
        debug!(%session, "greeting short-circuit");
        return Ok(GREETING_REPLY.to_string());
    }

    // Held until the exchange is recorded so same-session turns stay ordered.
    let session_log = state.sessions.log(session);
    let mut log = session_log.lock().await;

    let retrieval = match state.retrieval.search(&message).await? {
        RetrievalOutcome::Unavailable => return Ok(NOT_INITIALIZED_REPLY.to_string()),
        RetrievalOutcome::Completed(result) => result,
    };

    let prompt = build_prompt(&message, retrieval.as_ref());
    let messages = log.messages_with(&prompt);
    let answer = state.completer.complete(&messages).await?;

    log.append_exchange(prompt, answer.clone());
    info!(
        %session,
        grounded = retrieval.is_some(),
        turns = log.len(),
        "chat turn completed"
    );

    Ok(answer)
}
