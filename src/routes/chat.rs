use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{error, warn};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, NO_MESSAGE},
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    // Unreadable bodies fail the whole request.
    let Json(payload) = payload.map_err(|rejection| {
        error!(%rejection, "unreadable chat body");
        AppError::Internal(rejection.body_text())
    })?;

    let Some(message) = payload.message() else {
        warn!("chat request without a message");
        return Err(AppError::BadRequest(NO_MESSAGE.to_string()));
    };

    let reply = state.completion.complete(message).await.map_err(|e| {
        error!(error = %e, "completion failed");
        AppError::from(e)
    })?;

    Ok(Json(ChatResponse { response: reply }))
}
