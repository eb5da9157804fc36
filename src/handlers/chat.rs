use axum::{extract::State, Extension, Json};
use chrono::Utc;
use tracing::instrument;

use crate::dtos::chat::{ChatRequest, ChatResponse};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::services::chat::WebhookPayload;
use crate::state::AppState;

// POST /chat
#[instrument(skip(state, auth, payload), fields(user = %auth.username))]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::validation("Message cannot be empty"));
    }

    let session_id = payload
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}-{}", auth.user_id, Utc::now().timestamp_millis()));

    let reply = state
        .chat
        .reply(&WebhookPayload {
            message,
            session_id: &session_id,
            user: &auth.username,
        })
        .await;

    Ok(Json(ChatResponse {
        reply: reply.reply,
        source: reply.source,
        session_id,
    }))
}
