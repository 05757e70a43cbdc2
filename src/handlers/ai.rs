use axum::{extract::State, Extension, Json};
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::ai;
use crate::store;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub context: Option<String>,
}

/// Chat with the wellness assistant. The model sees the user's last week of
/// entries; if the upstream call fails for any reason the handler answers
/// with a canned response instead of an error.
pub async fn chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let message = body
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Message is required".into()))?;

    let week_ago = state.clock.today() - Duration::days(7);
    let recent_entries =
        store::entries::history(&state.db, auth_user.id, Some(week_ago), None, 5).await?;

    let (reply, context) =
        match ai::chat(&state.http, &state.config, message, &recent_entries).await {
            Ok(reply) => (reply, body.context.unwrap_or_else(|| "general".into())),
            Err(err) => {
                tracing::warn!(error = %err, "AI chat upstream failure, using fallback");
                (ai::fallback_response().to_string(), "fallback".into())
            }
        };

    Ok(Json(ApiResponse::ok(json!({
        "message": reply,
        "timestamp": state.clock.now(),
        "context": context,
    }))))
}
