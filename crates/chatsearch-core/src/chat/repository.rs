//! ChatRepository trait definition.
//!
//! The capability interface of the chat store: user-scoped CRUD over `Chat`
//! records addressed by (user_id, chat_id). Implementations live in
//! chatsearch-infra (in-memory and SQLite).

use chatsearch_types::chat::{Chat, Message};
use chatsearch_types::error::RepositoryError;

/// Repository trait for chat persistence.
///
/// Every method is a single store operation; nothing here spans a whole
/// question/answer turn. Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Insert a new chat, stamping `created_at`/`updated_at` to now.
    ///
    /// Fails with `AlreadyExists` if (user_id, chat_id) is taken.
    fn create(
        &self,
        chat: Chat,
    ) -> impl std::future::Future<Output = Result<Chat, RepositoryError>> + Send;

    /// Look up a chat. Absence is `Ok(None)`, never an error.
    fn get(
        &self,
        user_id: &str,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// All chats of one user, oldest first. Empty for unknown users.
    fn list_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// Rename a chat and refresh `updated_at`. Fails with `NotFound`.
    fn update_title(
        &self,
        user_id: &str,
        chat_id: &str,
        title: &str,
    ) -> impl std::future::Future<Output = Result<Chat, RepositoryError>> + Send;

    /// Append a message at the end of a chat and refresh `updated_at`.
    /// Fails with `NotFound`.
    fn append_message(
        &self,
        user_id: &str,
        chat_id: &str,
        message: Message,
    ) -> impl std::future::Future<Output = Result<Chat, RepositoryError>> + Send;

    /// Remove one chat. Returns whether it existed. Drops the user's
    /// namespace when its last chat goes.
    fn delete(
        &self,
        user_id: &str,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Return the existing chat, or create an empty one.
    ///
    /// `title` of `None` means "Chat {chat_id}".
    fn get_or_create(
        &self,
        user_id: &str,
        chat_id: &str,
        title: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Chat, RepositoryError>> + Send;

    /// Remove every chat of a user. Returns how many were removed.
    fn delete_user_chats(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    /// Every chat across all users, oldest first.
    fn list_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// Number of chats, for one user or overall.
    fn count_chats(
        &self,
        user_id: Option<&str>,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    /// Number of users with at least one chat.
    fn count_users(
        &self,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    /// Drop every chat. Returns how many were removed.
    fn clear(
        &self,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    /// Case-insensitive substring search over titles, optionally within one user.
    fn search_by_title(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;
}

/// Stable listing order shared by implementations: oldest first, then by (user_id, chat_id).
pub fn sort_chats(chats: &mut [Chat]) {
    chats.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.user_id.cmp(&b.user_id))
            .then_with(|| a.chat_id.cmp(&b.chat_id))
    });
}

/// Case-insensitive title match used by `search_by_title`.
pub fn title_matches(title: &str, query: &str) -> bool {
    title.to_lowercase().contains(&query.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_title_matches_case_insensitive() {
        assert!(title_matches("Rust Lifetimes", "lifetime"));
        assert!(title_matches("Chat c1", ""));
        assert!(!title_matches("Chat c1", "tokio"));
    }

    #[test]
    fn test_sort_chats_oldest_first() {
        let mut newer = Chat::new("u1", "a", "newer");
        let mut older = Chat::new("u1", "b", "older");
        older.created_at = Utc::now() - Duration::seconds(10);
        newer.created_at = Utc::now();

        let mut chats = vec![newer, older];
        sort_chats(&mut chats);
        assert_eq!(chats[0].title, "older");
        assert_eq!(chats[1].title, "newer");
    }
}
