//! `GET /chat/history/{session_id}` and `POST /chat/clear`: direct reads
//! and resets against the process-local chat memory store. Session
//! history here is ephemeral — it's a convenience for UIs, not the
//! durable record of anything.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use docurag_state::MessageRole;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;
use crate::impl_has_status;
use crate::routes::response::ResponseStatus;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageDto {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatHistoryResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessageDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClearChatRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearChatResponse {
    pub status: ResponseStatus,
    pub message: String,
}
impl_has_status!(ClearChatResponse);

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat/history/{session_id}", get(chat_history))
        .route("/chat/clear", post(clear_chat))
        .with_state(state)
}

#[utoipa::path(get, path = "/chat/history/{session_id}", responses((status = 200, body = ChatHistoryResponse)))]
async fn chat_history(State(state): State<AppState>, Path(session_id): Path<String>) -> Result<Json<ChatHistoryResponse>> {
    let messages = state
        .memory
        .get_messages(&session_id)
        .into_iter()
        .map(|m| ChatMessageDto { role: role_name(m.role).to_string(), content: m.content })
        .collect();

    Ok(Json(ChatHistoryResponse { session_id, messages }))
}

#[utoipa::path(post, path = "/chat/clear", request_body = ClearChatRequest, responses((status = 200, body = ClearChatResponse)))]
async fn clear_chat(State(state): State<AppState>, Json(body): Json<ClearChatRequest>) -> Result<Json<ClearChatResponse>> {
    state.memory.clear(&body.session_id);
    Ok(Json(ClearChatResponse {
        status: ResponseStatus::Success,
        message: format!("chat history cleared for session {}", body.session_id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use docurag_state::ChatMessage;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unseen_session_returns_an_empty_history() {
        let state = test_state();
        let app = routes(state);
        let response = app
            .oneshot(
                axum::http::Request::get("/chat/history/s1").body(axum::body::Body::empty()).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: ChatHistoryResponse = serde_json::from_slice(&body).unwrap();
        assert!(parsed.messages.is_empty());
    }

    #[tokio::test]
    async fn clearing_a_session_empties_its_history() {
        let state = test_state();
        state.memory.append("s1", ChatMessage { role: MessageRole::User, content: "hi".to_string() });

        let app = routes(state.clone());
        let body = serde_json::json!({ "session_id": "s1" });
        let response = app
            .oneshot(
                axum::http::Request::post("/chat/clear")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert!(state.memory.get_messages("s1").is_empty());
    }
}
