use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::messages::{ChatRequest, ChatResponse};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Forward a conversation to the chat backend and return its reply.
///
/// The message list is passed through untouched; an empty list is sent as-is.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(request) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    debug!(messages = ?request.messages, "Sending conversation to chat backend");
    info!(
        model = state.chat.model(),
        messages = request.messages.len(),
        "Chat request"
    );

    let reply = state.chat.complete(&request.messages).await?;

    debug!(reply = %reply, "Chat reply");
    Ok(Json(ChatResponse::ok(reply)))
}
