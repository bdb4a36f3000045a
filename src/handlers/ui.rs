use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Browser client: upload a file, show the transcript, then the chat reply.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
