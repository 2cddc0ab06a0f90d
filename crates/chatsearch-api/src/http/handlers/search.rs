//! Question/answer endpoint.
//!
//! POST /search - run one turn and return the chat transcript.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use chatsearch_types::chat::Message;

use super::{preview, require_non_empty};
use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub user_id: String,
    pub chat_id: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub messages: Vec<Message>,
}

/// POST /search - Append the question, generate an answer, return all messages.
pub async fn post_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(request) = payload?;
    require_non_empty("user_id", &request.user_id)?;
    require_non_empty("chat_id", &request.chat_id)?;
    require_non_empty("question", &request.question)?;

    tracing::info!(
        user_id = %request.user_id,
        chat_id = %request.chat_id,
        question = %preview(&request.question, 50),
        "Search request received"
    );

    let messages = state
        .chat_service
        .handle_search(&request.user_id, &request.chat_id, &request.question)
        .await?;

    Ok(Json(SearchResponse { messages }))
}
