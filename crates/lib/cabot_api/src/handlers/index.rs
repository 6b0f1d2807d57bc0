//! Chat UI page.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// `GET /`: static chat page.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
