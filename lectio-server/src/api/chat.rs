//! Chat relay endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use lectio_common::api::{ChatKind, ChatRequest, ChatResponse};

use crate::error::ApiResult;
use crate::services::chat::relay;
use crate::AppState;

/// POST /api/chat  `{userPrompt, type?}` → `{text}`
pub async fn chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = request?;
    let kind = ChatKind::from_type(request.kind.as_deref());

    let text = relay(state.chat.as_ref(), kind, &request.user_prompt).await?;

    Ok(Json(ChatResponse { text }))
}
