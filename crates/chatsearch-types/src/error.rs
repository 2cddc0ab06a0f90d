use thiserror::Error;

use crate::llm::LlmError;

/// Errors from chat store operations (used by the repository trait in chatsearch-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("chat {chat_id} already exists for user {user_id}")]
    AlreadyExists { user_id: String, chat_id: String },

    #[error("chat {chat_id} not found for user {user_id}")]
    NotFound { user_id: String, chat_id: String },

    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

impl RepositoryError {
    pub fn not_found(user_id: &str, chat_id: &str) -> Self {
        RepositoryError::NotFound {
            user_id: user_id.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    pub fn already_exists(user_id: &str, chat_id: &str) -> Self {
        RepositoryError::AlreadyExists {
            user_id: user_id.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RepositoryError::AlreadyExists { .. } => "AlreadyExists",
            RepositoryError::NotFound { .. } => "NotFound",
            RepositoryError::Connection | RepositoryError::Query(_) => "RepositoryError",
        }
    }
}

/// Errors from the answer generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Failed(String),
}

/// Errors surfaced by the conversation orchestrator.
///
/// Repository errors pass through untouched; generator errors are wrapped
/// as `GenerationFailed`. Nothing is retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("answer generation failed: {0}")]
    GenerationFailed(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Repository(e) => e.kind(),
            ServiceError::GenerationFailed(_) => "GenerationFailed",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Repository(RepositoryError::NotFound { .. }))
    }
}

impl From<GenerationError> for ServiceError {
    fn from(e: GenerationError) -> Self {
        ServiceError::GenerationFailed(e.to_string())
    }
}

/// Errors loading the service configuration from an explicit path.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::not_found("u1", "c1");
        assert_eq!(err.to_string(), "chat c1 not found for user u1");
        assert_eq!(err.kind(), "NotFound");

        let err = RepositoryError::already_exists("u1", "c1");
        assert_eq!(err.to_string(), "chat c1 already exists for user u1");
        assert_eq!(err.kind(), "AlreadyExists");
    }

    #[test]
    fn test_service_error_wraps_generation() {
        let err: ServiceError = GenerationError::Failed("model offline".to_string()).into();
        assert_eq!(err.kind(), "GenerationFailed");
        assert!(err.to_string().contains("model offline"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_service_error_passes_repository_kind() {
        let err: ServiceError = RepositoryError::not_found("u", "c").into();
        assert!(err.is_not_found());
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn test_generation_error_from_llm() {
        let err: GenerationError = LlmError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "authentication failed");
    }
}
