use axum::{extract::State, response::Json};
use std::sync::Arc;
use tracing::debug;

use super::messages::HealthResponse;
use crate::state::AppState;

/// Liveness probe reporting the loaded speech model.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "healthy".to_string(),
        model: state.transcriber.model_name().to_string(),
    })
}
