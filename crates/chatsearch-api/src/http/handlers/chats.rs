//! Chat management HTTP handlers.
//!
//! Endpoints:
//! - GET    /searches/{user_id}                  - List a user's chats (?title= filter)
//! - DELETE /searches/{user_id}                  - Delete all of a user's chats
//! - POST   /searches/{user_id}/chats            - Create an empty chat
//! - GET    /searches/{user_id}/chats/{chat_id}  - Get one chat
//! - DELETE /searches/{user_id}/chats/{chat_id}  - Delete one chat
//! - PATCH  /searches/{user_id}/chats/{chat_id}  - Rename a chat
//! - GET    /stats                               - User and chat counts

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use chatsearch_core::chat::service::ChatStats;
use chatsearch_types::chat::Chat;

use super::require_non_empty;
use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatListQuery {
    /// Case-insensitive substring to match against chat titles.
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub chat_id: String,
    #[serde(default)]
    pub chat_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatTitleUpdateRequest {
    pub chat_title: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteChatResponse {
    pub message: String,
    pub deleted: bool,
}

/// GET /searches/{user_id} - All chats for a user, oldest first.
pub async fn list_user_chats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ChatListQuery>,
) -> Result<Json<Vec<Chat>>, AppError> {
    let title = query.title.as_deref().filter(|t| !t.trim().is_empty());
    tracing::info!(%user_id, title = ?title, "Get user chats request");

    let chats = state.chat_service.list_user_chats(&user_id, title).await?;
    Ok(Json(chats))
}

/// DELETE /searches/{user_id} - Remove every chat the user owns.
pub async fn delete_user_chats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    tracing::info!(%user_id, "Delete user chats request");
    let deleted_count = state.chat_service.delete_user_chats(&user_id).await?;
    Ok(Json(json!({ "deleted_count": deleted_count })))
}

/// POST /searches/{user_id}/chats - Create an empty chat; 409 if the id is taken.
pub async fn create_chat(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Chat>), AppError> {
    let Json(request) = payload?;
    require_non_empty("chat_id", &request.chat_id)?;
    if let Some(title) = &request.chat_title {
        require_non_empty("chat_title", title)?;
    }

    tracing::info!(%user_id, chat_id = %request.chat_id, "Create chat request");
    let chat = state
        .chat_service
        .create_chat(&user_id, &request.chat_id, request.chat_title.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// GET /searches/{user_id}/chats/{chat_id} - One chat with all its messages.
pub async fn get_chat(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(String, String)>,
) -> Result<Json<Chat>, AppError> {
    tracing::info!(%user_id, %chat_id, "Get chat request");
    state
        .chat_service
        .get_chat(&user_id, &chat_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&user_id, &chat_id))
}

/// DELETE /searches/{user_id}/chats/{chat_id}
pub async fn delete_chat(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(String, String)>,
) -> Result<Json<DeleteChatResponse>, AppError> {
    tracing::info!(%user_id, %chat_id, "Delete chat request");
    if !state.chat_service.delete_chat(&user_id, &chat_id).await? {
        return Err(AppError::not_found(&user_id, &chat_id));
    }

    Ok(Json(DeleteChatResponse {
        message: format!("Chat {chat_id} deleted successfully"),
        deleted: true,
    }))
}

/// PATCH /searches/{user_id}/chats/{chat_id} - Set a new title.
pub async fn update_chat_title(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(String, String)>,
    payload: Result<Json<ChatTitleUpdateRequest>, JsonRejection>,
) -> Result<Json<Chat>, AppError> {
    let Json(request) = payload?;
    require_non_empty("chat_title", &request.chat_title)?;

    tracing::info!(%user_id, %chat_id, title = %request.chat_title, "Update chat title request");
    let chat = state
        .chat_service
        .update_chat_title(&user_id, &chat_id, &request.chat_title)
        .await?;
    Ok(Json(chat))
}

/// GET /stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<ChatStats>, AppError> {
    Ok(Json(state.chat_service.stats().await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::http::test_support::{router_answering, send};

    async fn ask(router: &axum::Router, user_id: &str, chat_id: &str, question: &str) {
        let (status, _) = send(
            router,
            "POST",
            "/search",
            Some(json!({"user_id": user_id, "chat_id": chat_id, "question": question})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn get_missing_chat_is_404() {
        let router = router_answering("a");
        let (status, body) = send(&router, "GET", "/searches/u1/chats/nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["type"], "NotFound");
        assert_eq!(body["detail"], "Chat nope not found for user u1");
    }

    #[tokio::test]
    async fn list_is_scoped_to_user_and_filterable() {
        let router = router_answering("a");
        ask(&router, "u1", "c1", "q").await;
        ask(&router, "u1", "c2", "q").await;
        ask(&router, "u2", "c1", "q").await;

        let (status, body) = send(&router, "GET", "/searches/u1", None).await;
        assert_eq!(status, StatusCode::OK);
        let chats = body.as_array().unwrap();
        assert_eq!(chats.len(), 2);
        assert!(chats.iter().all(|c| c["user_id"] == "u1"));

        let (_, none) = send(&router, "GET", "/searches/nobody", None).await;
        assert_eq!(none, json!([]));

        let (_, filtered) = send(&router, "GET", "/searches/u1?title=chat%20C2", None).await;
        let filtered = filtered.as_array().unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["chat_id"], "c2");
    }

    #[tokio::test]
    async fn patch_renames_and_keeps_messages() {
        let router = router_answering("a");
        ask(&router, "u1", "c1", "q").await;

        let (status, chat) = send(
            &router,
            "PATCH",
            "/searches/u1/chats/c1",
            Some(json!({"chat_title": "Renamed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chat["title"], "Renamed");
        assert_eq!(chat["messages"].as_array().unwrap().len(), 2);

        let (status, _) = send(
            &router,
            "PATCH",
            "/searches/u1/chats/missing",
            Some(json!({"chat_title": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &router,
            "PATCH",
            "/searches/u1/chats/c1",
            Some(json!({"chat_title": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "ValidationError");
    }

    #[tokio::test]
    async fn delete_chat_then_404() {
        let router = router_answering("a");
        ask(&router, "u1", "c1", "q").await;

        let (status, body) = send(&router, "DELETE", "/searches/u1/chats/c1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], true);
        assert_eq!(body["message"], "Chat c1 deleted successfully");

        let (status, _) = send(&router, "DELETE", "/searches/u1/chats/c1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&router, "GET", "/searches/u1/chats/c1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_chat_conflicts_on_existing_id() {
        let router = router_answering("a");

        let (status, chat) = send(
            &router,
            "POST",
            "/searches/u1/chats",
            Some(json!({"chat_id": "c1", "chat_title": "Planning"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(chat["title"], "Planning");
        assert_eq!(chat["messages"], json!([]));

        let (status, body) = send(
            &router,
            "POST",
            "/searches/u1/chats",
            Some(json!({"chat_id": "c1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["type"], "AlreadyExists");
    }

    #[tokio::test]
    async fn delete_user_chats_and_stats() {
        let router = router_answering("a");
        ask(&router, "u1", "c1", "q").await;
        ask(&router, "u1", "c2", "q").await;
        ask(&router, "u2", "c1", "q").await;

        let (_, stats) = send(&router, "GET", "/stats", None).await;
        assert_eq!(stats, json!({"users": 2, "chats": 3}));

        let (status, body) = send(&router, "DELETE", "/searches/u1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted_count"], 2);

        let (_, stats) = send(&router, "GET", "/stats", None).await;
        assert_eq!(stats, json!({"users": 1, "chats": 1}));
    }
}
