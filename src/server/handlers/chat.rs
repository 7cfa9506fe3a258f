use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::chat::ChatTurnRequest;
use crate::core::errors::{ApiError, UPSTREAM_APOLOGY};
use crate::render::render_to_markup;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub text: String,
}

/// `POST /api/chat` with `{message, history}`.
///
/// Upstream failures still answer with a displayable apology alongside the
/// error so widgets can show it as an assistant message.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatTurnRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    match state.chat.handle_turn(request).await {
        Ok(response) => Ok(Json(response).into_response()),
        Err(ApiError::UpstreamUnavailable(msg)) => {
            tracing::error!("Chat turn failed upstream: {}", msg);
            let body = Json(json!({
                "error": UPSTREAM_APOLOGY,
                "response": UPSTREAM_APOLOGY,
                "formatted_response": render_to_markup(UPSTREAM_APOLOGY),
                "sources": [],
            }));
            Ok((StatusCode::BAD_GATEWAY, body).into_response())
        }
        Err(err) => Err(err),
    }
}

/// `POST /api/render` with `{text}`; formats stored transcripts.
pub async fn render(
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    Ok(Json(json!({
        "formatted_response": render_to_markup(&request.text),
    })))
}
