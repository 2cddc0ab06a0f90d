//! Application error type mapping to HTTP status codes.
//!
//! Every error body has the shape `{"error", "detail", "type"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use chatsearch_types::error::{RepositoryError, ServiceError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the chat service (store or generator).
    Service(ServiceError),
    /// Lookup of a chat that does not exist.
    NotFound { user_id: String, chat_id: String },
    /// Request failed validation.
    Validation(String),
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        AppError::Service(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Service(ServiceError::Repository(e))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn not_found(user_id: &str, chat_id: &str) -> Self {
        AppError::NotFound {
            user_id: user_id.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, &'static str, String) {
        match self {
            AppError::NotFound { user_id, chat_id } => (
                StatusCode::NOT_FOUND,
                "Not found",
                "NotFound",
                format!("Chat {chat_id} not found for user {user_id}"),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                "ValidationError",
                msg.clone(),
            ),
            AppError::Service(ServiceError::Repository(RepositoryError::NotFound {
                user_id,
                chat_id,
            })) => (
                StatusCode::NOT_FOUND,
                "Not found",
                "NotFound",
                format!("Chat {chat_id} not found for user {user_id}"),
            ),
            AppError::Service(e @ ServiceError::Repository(RepositoryError::AlreadyExists { .. })) => {
                (StatusCode::CONFLICT, "Conflict", e.kind(), e.to_string())
            }
            AppError::Service(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                e.kind(),
                e.to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, kind, detail) = self.parts();

        if status.is_server_error() {
            tracing::error!(kind, %detail, "Request failed");
        } else {
            tracing::warn!(kind, %detail, "Request rejected");
        }

        let body = json!({
            "error": error,
            "detail": detail,
            "type": kind,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses_and_kinds() {
        let cases = [
            (AppError::not_found("u1", "c1"), StatusCode::NOT_FOUND, "NotFound"),
            (
                AppError::Validation("question must not be empty".into()),
                StatusCode::BAD_REQUEST,
                "ValidationError",
            ),
            (
                RepositoryError::already_exists("u1", "c1").into(),
                StatusCode::CONFLICT,
                "AlreadyExists",
            ),
            (
                ServiceError::GenerationFailed("provider down".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "GenerationFailed",
            ),
            (
                RepositoryError::Query("disk I/O error".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "RepositoryError",
            ),
            (
                RepositoryError::not_found("u1", "c1").into(),
                StatusCode::NOT_FOUND,
                "NotFound",
            ),
        ];

        for (err, status, kind) in cases {
            let (got_status, _, got_kind, _) = err.parts();
            assert_eq!(got_status, status);
            assert_eq!(got_kind, kind);
        }
    }
}
