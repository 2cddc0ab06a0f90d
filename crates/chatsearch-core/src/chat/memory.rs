//! In-memory chat store.
//!
//! `InMemoryChatRepository` keeps a `DashMap` from user_id to that user's
//! chats. Each operation runs under the user's shard lock, so single
//! operations are atomic; nothing is held across `.await`. Reads return
//! clones. Contents live for the process lifetime only.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use chatsearch_types::chat::{Chat, Message, default_chat_title};
use chatsearch_types::error::RepositoryError;

use super::repository::{ChatRepository, sort_chats, title_matches};

/// DashMap-backed implementation of `ChatRepository`.
///
/// Cloning produces a shared view of the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatRepository {
    chats: Arc<DashMap<String, HashMap<String, Chat>>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        info!("In-memory chat repository initialized");
        Self::default()
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn create(&self, mut chat: Chat) -> Result<Chat, RepositoryError> {
        let mut user_chats = self.chats.entry(chat.user_id.clone()).or_default();

        if user_chats.contains_key(&chat.chat_id) {
            warn!(user_id = %chat.user_id, chat_id = %chat.chat_id, "Chat already exists");
            return Err(RepositoryError::already_exists(&chat.user_id, &chat.chat_id));
        }

        chat.stamp_created();
        user_chats.insert(chat.chat_id.clone(), chat.clone());
        info!(user_id = %chat.user_id, chat_id = %chat.chat_id, "Created chat");
        Ok(chat)
    }

    async fn get(&self, user_id: &str, chat_id: &str) -> Result<Option<Chat>, RepositoryError> {
        let chat = self
            .chats
            .get(user_id)
            .and_then(|user_chats| user_chats.get(chat_id).cloned());

        if chat.is_none() {
            debug!(user_id, chat_id, "Chat not found");
        }
        Ok(chat)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Chat>, RepositoryError> {
        let mut chats: Vec<Chat> = self
            .chats
            .get(user_id)
            .map(|user_chats| user_chats.values().cloned().collect())
            .unwrap_or_default();
        sort_chats(&mut chats);
        debug!(user_id, count = chats.len(), "Listed user chats");
        Ok(chats)
    }

    async fn update_title(
        &self,
        user_id: &str,
        chat_id: &str,
        title: &str,
    ) -> Result<Chat, RepositoryError> {
        let mut user_chats = self.chats.get_mut(user_id).ok_or_else(|| {
            warn!(user_id, chat_id, "Cannot update title, chat not found");
            RepositoryError::not_found(user_id, chat_id)
        })?;
        let chat = user_chats.get_mut(chat_id).ok_or_else(|| {
            warn!(user_id, chat_id, "Cannot update title, chat not found");
            RepositoryError::not_found(user_id, chat_id)
        })?;

        chat.set_title(title);
        info!(user_id, chat_id, title, "Updated chat title");
        Ok(chat.clone())
    }

    async fn append_message(
        &self,
        user_id: &str,
        chat_id: &str,
        message: Message,
    ) -> Result<Chat, RepositoryError> {
        let mut user_chats = self.chats.get_mut(user_id).ok_or_else(|| {
            warn!(user_id, chat_id, "Cannot add message, chat not found");
            RepositoryError::not_found(user_id, chat_id)
        })?;
        let chat = user_chats.get_mut(chat_id).ok_or_else(|| {
            warn!(user_id, chat_id, "Cannot add message, chat not found");
            RepositoryError::not_found(user_id, chat_id)
        })?;

        chat.push_message(message);
        info!(user_id, chat_id, message_count = chat.messages.len(), "Added message to chat");
        Ok(chat.clone())
    }

    async fn delete(&self, user_id: &str, chat_id: &str) -> Result<bool, RepositoryError> {
        let removed = match self.chats.get_mut(user_id) {
            Some(mut user_chats) => user_chats.remove(chat_id).is_some(),
            None => false,
        };

        if !removed {
            warn!(user_id, chat_id, "Cannot delete chat, not found");
            return Ok(false);
        }

        // Shard guard above is released; drop the namespace if it is now empty.
        self.chats.remove_if(user_id, |_, user_chats| user_chats.is_empty());
        info!(user_id, chat_id, "Deleted chat");
        Ok(true)
    }

    async fn get_or_create(
        &self,
        user_id: &str,
        chat_id: &str,
        title: Option<&str>,
    ) -> Result<Chat, RepositoryError> {
        let mut user_chats = self.chats.entry(user_id.to_string()).or_default();

        if let Some(existing) = user_chats.get(chat_id) {
            debug!(user_id, chat_id, "Retrieved existing chat");
            return Ok(existing.clone());
        }

        let title = title.map_or_else(|| default_chat_title(chat_id), str::to_string);
        let chat = Chat::new(user_id, chat_id, title);
        user_chats.insert(chat_id.to_string(), chat.clone());
        info!(user_id, chat_id, "Created new chat");
        Ok(chat)
    }

    async fn delete_user_chats(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let deleted = self
            .chats
            .remove(user_id)
            .map(|(_, user_chats)| user_chats.len())
            .unwrap_or(0);

        if deleted == 0 {
            debug!(user_id, "No chats to delete");
        } else {
            info!(user_id, deleted, "Deleted all chats for user");
        }
        Ok(deleted)
    }

    async fn list_all(&self) -> Result<Vec<Chat>, RepositoryError> {
        let mut chats: Vec<Chat> = self
            .chats
            .iter()
            .flat_map(|entry| entry.value().values().cloned().collect::<Vec<_>>())
            .collect();
        sort_chats(&mut chats);
        debug!(count = chats.len(), "Listed all chats");
        Ok(chats)
    }

    async fn count_chats(&self, user_id: Option<&str>) -> Result<usize, RepositoryError> {
        let count = match user_id {
            Some(user_id) => self.chats.get(user_id).map_or(0, |user_chats| user_chats.len()),
            None => self.chats.iter().map(|entry| entry.value().len()).sum(),
        };
        Ok(count)
    }

    async fn count_users(&self) -> Result<usize, RepositoryError> {
        Ok(self.chats.len())
    }

    async fn clear(&self) -> Result<usize, RepositoryError> {
        let total: usize = self.chats.iter().map(|entry| entry.value().len()).sum();
        self.chats.clear();
        warn!(total, "Cleared all chats from repository");
        Ok(total)
    }

    async fn search_by_title(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<Chat>, RepositoryError> {
        let mut matches: Vec<Chat> = match user_id {
            Some(user_id) => self
                .chats
                .get(user_id)
                .map(|user_chats| {
                    user_chats
                        .values()
                        .filter(|c| title_matches(&c.title, query))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            None => self
                .chats
                .iter()
                .flat_map(|entry| {
                    entry
                        .value()
                        .values()
                        .filter(|c| title_matches(&c.title, query))
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .collect(),
        };
        sort_chats(&mut matches);
        debug!(query, count = matches.len(), "Searched chats by title");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatsearch_types::chat::MessageRole;

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryChatRepository::new();
        let created = repo.create(Chat::new("u1", "c1", "First")).await.unwrap();
        assert_eq!(created.title, "First");
        assert_eq!(created.created_at, created.updated_at);

        let fetched = repo.get("u1", "c1").await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let repo = InMemoryChatRepository::new();
        repo.create(Chat::new("u1", "c1", "First")).await.unwrap();
        let err = repo.create(Chat::new("u1", "c1", "Again")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists { .. }));

        // Same chat_id under another user is fine.
        repo.create(Chat::new("u2", "c1", "Other user")).await.unwrap();
        assert_eq!(repo.count_chats(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = InMemoryChatRepository::new();
        assert!(repo.get("nobody", "c1").await.unwrap().is_none());
        repo.create(Chat::new("u1", "c1", "t")).await.unwrap();
        assert!(repo.get("u1", "c2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_user() {
        let repo = InMemoryChatRepository::new();
        assert!(repo.list_by_user("u1").await.unwrap().is_empty());

        repo.create(Chat::new("u1", "c1", "one")).await.unwrap();
        repo.create(Chat::new("u1", "c2", "two")).await.unwrap();
        repo.create(Chat::new("u2", "c3", "three")).await.unwrap();

        let chats = repo.list_by_user("u1").await.unwrap();
        assert_eq!(chats.len(), 2);
        assert!(chats.iter().all(|c| c.user_id == "u1"));
    }

    #[tokio::test]
    async fn test_update_title_preserves_messages_and_created_at() {
        let repo = InMemoryChatRepository::new();
        let created = repo.get_or_create("u1", "c1", None).await.unwrap();
        repo.append_message("u1", "c1", Message::user("hi")).await.unwrap();

        let updated = repo.update_title("u1", "c1", "Renamed").await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_update_title_missing_fails() {
        let repo = InMemoryChatRepository::new();
        let err = repo.update_title("u1", "c1", "x").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_append_message_preserves_order() {
        let repo = InMemoryChatRepository::new();
        repo.get_or_create("u1", "c1", None).await.unwrap();
        repo.append_message("u1", "c1", Message::user("q1")).await.unwrap();
        repo.append_message("u1", "c1", Message::assistant("a1")).await.unwrap();
        let chat = repo.append_message("u1", "c1", Message::user("q2")).await.unwrap();

        let contents: Vec<&str> = chat.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q1", "a1", "q2"]);
        assert_eq!(chat.messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_append_message_missing_fails() {
        let repo = InMemoryChatRepository::new();
        let err = repo
            .append_message("u1", "c1", Message::user("q"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_empty_namespace() {
        let repo = InMemoryChatRepository::new();
        repo.get_or_create("u1", "c1", None).await.unwrap();
        repo.get_or_create("u1", "c2", None).await.unwrap();
        assert_eq!(repo.count_users().await.unwrap(), 1);

        assert!(repo.delete("u1", "c1").await.unwrap());
        assert!(repo.get("u1", "c1").await.unwrap().is_none());
        assert_eq!(repo.count_users().await.unwrap(), 1);

        assert!(repo.delete("u1", "c2").await.unwrap());
        assert_eq!(repo.count_users().await.unwrap(), 0);

        assert!(!repo.delete("u1", "c2").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let repo = InMemoryChatRepository::new();
        let first = repo.get_or_create("u1", "c1", None).await.unwrap();
        assert_eq!(first.title, "Chat c1");
        assert!(first.messages.is_empty());

        let second = repo.get_or_create("u1", "c1", Some("ignored")).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_or_create_uses_supplied_title() {
        let repo = InMemoryChatRepository::new();
        let chat = repo.get_or_create("u1", "c9", Some("Custom")).await.unwrap();
        assert_eq!(chat.title, "Custom");
    }

    #[tokio::test]
    async fn test_delete_user_chats_and_counts() {
        let repo = InMemoryChatRepository::new();
        repo.get_or_create("u1", "c1", None).await.unwrap();
        repo.get_or_create("u1", "c2", None).await.unwrap();
        repo.get_or_create("u2", "c1", None).await.unwrap();

        assert_eq!(repo.count_chats(Some("u1")).await.unwrap(), 2);
        assert_eq!(repo.count_chats(None).await.unwrap(), 3);
        assert_eq!(repo.count_users().await.unwrap(), 2);

        assert_eq!(repo.delete_user_chats("u1").await.unwrap(), 2);
        assert_eq!(repo.delete_user_chats("u1").await.unwrap(), 0);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let repo = InMemoryChatRepository::new();
        repo.get_or_create("u1", "c1", None).await.unwrap();
        repo.get_or_create("u2", "c1", None).await.unwrap();
        assert_eq!(repo.clear().await.unwrap(), 2);
        assert_eq!(repo.count_chats(None).await.unwrap(), 0);
        assert_eq!(repo.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_by_title() {
        let repo = InMemoryChatRepository::new();
        repo.get_or_create("u1", "c1", Some("Rust lifetimes")).await.unwrap();
        repo.get_or_create("u1", "c2", Some("Trip to Tokyo")).await.unwrap();
        repo.get_or_create("u2", "c3", Some("rust async")).await.unwrap();

        assert_eq!(repo.search_by_title("RUST", None).await.unwrap().len(), 2);
        let scoped = repo.search_by_title("rust", Some("u1")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].chat_id, "c1");
        assert!(repo.search_by_title("rust", Some("u9")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_every_message() {
        let repo = InMemoryChatRepository::new();
        repo.get_or_create("u1", "c1", None).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.append_message("u1", "c1", Message::user(format!("message-{i}")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let chat = repo.get("u1", "c1").await.unwrap().unwrap();
        assert_eq!(chat.messages.len(), 50);
        let mut contents: Vec<String> = chat.messages.into_iter().map(|m| m.content).collect();
        contents.sort();
        let mut expected: Vec<String> = (0..50).map(|i| format!("message-{i}")).collect();
        expected.sort();
        assert_eq!(contents, expected);
    }
}
