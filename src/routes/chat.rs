use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
};

use crate::{
    error::AppError,
    message::{ChatRequest, Message},
    services::metrics_manager::MetricsData,
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Message>, AppError> {
    let body = body.map_err(|e| {
        tracing::error!(error = %e, "failed to read chat request body");
        AppError::MalformedRequest(e.body_text())
    })?;

    let payload: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "error in chat API");
        AppError::MalformedRequest(e.to_string())
    })?;

    let reply = state.responder.reply(&payload.messages).await;
    state.metrics.record_reply(reply.source).await;

    Ok(Json(reply.message))
}

pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.get_metrics().await)
}
