//! Runtime-selected chat store.
//!
//! `ChatStore` lets the application pick the in-memory or SQLite backend from
//! configuration while services stay generic over `ChatRepository`.

use chatsearch_core::chat::memory::InMemoryChatRepository;
use chatsearch_core::chat::repository::ChatRepository;
use chatsearch_types::chat::{Chat, Message};
use chatsearch_types::config::{StorageBackend, StorageConfig};
use chatsearch_types::error::RepositoryError;

use crate::sqlite::chat::SqliteChatRepository;
use crate::sqlite::pool::DatabasePool;

/// Chat store backend chosen at startup.
pub enum ChatStore {
    Memory(InMemoryChatRepository),
    Sqlite(SqliteChatRepository),
}

impl ChatStore {
    /// Open the backend named in `config`.
    ///
    /// The SQLite backend connects and runs migrations before returning.
    pub async fn open(config: &StorageConfig) -> Result<Self, sqlx::Error> {
        match config.backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory chat store");
                Ok(ChatStore::Memory(InMemoryChatRepository::new()))
            }
            StorageBackend::Sqlite => {
                let pool = DatabasePool::connect(config).await?;
                Ok(ChatStore::Sqlite(SqliteChatRepository::new(pool)))
            }
        }
    }

    pub fn backend(&self) -> StorageBackend {
        match self {
            ChatStore::Memory(_) => StorageBackend::Memory,
            ChatStore::Sqlite(_) => StorageBackend::Sqlite,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            ChatStore::Memory($repo) => $call.await,
            ChatStore::Sqlite($repo) => $call.await,
        }
    };
}

impl ChatRepository for ChatStore {
    async fn create(&self, chat: Chat) -> Result<Chat, RepositoryError> {
        dispatch!(self, repo => repo.create(chat))
    }

    async fn get(&self, user_id: &str, chat_id: &str) -> Result<Option<Chat>, RepositoryError> {
        dispatch!(self, repo => repo.get(user_id, chat_id))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Chat>, RepositoryError> {
        dispatch!(self, repo => repo.list_by_user(user_id))
    }

    async fn update_title(
        &self,
        user_id: &str,
        chat_id: &str,
        title: &str,
    ) -> Result<Chat, RepositoryError> {
        dispatch!(self, repo => repo.update_title(user_id, chat_id, title))
    }

    async fn append_message(
        &self,
        user_id: &str,
        chat_id: &str,
        message: Message,
    ) -> Result<Chat, RepositoryError> {
        dispatch!(self, repo => repo.append_message(user_id, chat_id, message))
    }

    async fn delete(&self, user_id: &str, chat_id: &str) -> Result<bool, RepositoryError> {
        dispatch!(self, repo => repo.delete(user_id, chat_id))
    }

    async fn get_or_create(
        &self,
        user_id: &str,
        chat_id: &str,
        title: Option<&str>,
    ) -> Result<Chat, RepositoryError> {
        dispatch!(self, repo => repo.get_or_create(user_id, chat_id, title))
    }

    async fn delete_user_chats(&self, user_id: &str) -> Result<usize, RepositoryError> {
        dispatch!(self, repo => repo.delete_user_chats(user_id))
    }

    async fn list_all(&self) -> Result<Vec<Chat>, RepositoryError> {
        dispatch!(self, repo => repo.list_all())
    }

    async fn count_chats(&self, user_id: Option<&str>) -> Result<usize, RepositoryError> {
        dispatch!(self, repo => repo.count_chats(user_id))
    }

    async fn count_users(&self) -> Result<usize, RepositoryError> {
        dispatch!(self, repo => repo.count_users())
    }

    async fn clear(&self) -> Result<usize, RepositoryError> {
        dispatch!(self, repo => repo.clear())
    }

    async fn search_by_title(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<Chat>, RepositoryError> {
        dispatch!(self, repo => repo.search_by_title(query, user_id))
    }
}
