use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, chat, transcribe, ui};
use crate::state::AppState;
use std::sync::Arc;

/// Create the gateway routes.
///
/// `max_upload_bytes` caps every request body; an oversized upload is
/// answered with 413.
pub fn create_api_router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(ui::index))
        .route("/health", get(api::health_check))
        .route("/transcribe", post(transcribe::transcribe))
        .route("/chat", post(chat::chat))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}
