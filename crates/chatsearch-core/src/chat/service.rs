//! Chat service orchestrating question/answer turns.
//!
//! `ChatService` coordinates the `ChatRepository` and the `AnswerGenerator`:
//! resolve or create the chat, append the question, generate an answer from
//! the earlier messages, append the answer, return the transcript.

use serde::Serialize;
use tracing::{error, info, warn};

use chatsearch_types::chat::{Chat, Message, SessionKey, default_chat_title};
use chatsearch_types::error::ServiceError;

use super::generator::AnswerGenerator;
use super::locks::TurnLocks;
use super::repository::ChatRepository;

/// Aggregate counts over the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChatStats {
    pub users: usize,
    pub chats: usize,
}

/// Orchestrates chat turns and chat management.
///
/// Generic over `ChatRepository` and `AnswerGenerator` so the core never
/// depends on chatsearch-infra. Share it behind an `Arc`; all methods take `&self`.
pub struct ChatService<R: ChatRepository, G: AnswerGenerator> {
    repo: R,
    generator: G,
    turn_locks: Option<TurnLocks>,
}

impl<R: ChatRepository, G: AnswerGenerator> ChatService<R, G> {
    /// Create a service whose turns on the same chat are serialized.
    pub fn new(repo: R, generator: G) -> Self {
        Self {
            repo,
            generator,
            turn_locks: Some(TurnLocks::new()),
        }
    }

    /// Create a service with no per-chat turn locking.
    ///
    /// Concurrent turns on one chat may interleave their appends.
    pub fn without_turn_locks(repo: R, generator: G) -> Self {
        Self {
            repo,
            generator,
            turn_locks: None,
        }
    }

    /// Access the chat repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Whether turns on the same chat are serialized.
    pub fn serializes_turns(&self) -> bool {
        self.turn_locks.is_some()
    }

    // --- Question/answer turn ---

    /// Run one question/answer turn and return the chat's full transcript.
    ///
    /// A failed generation leaves the user message in place; nothing is
    /// rolled back or retried.
    pub async fn handle_search(
        &self,
        user_id: &str,
        chat_id: &str,
        question: &str,
    ) -> Result<Vec<Message>, ServiceError> {
        let Some(locks) = &self.turn_locks else {
            return self.run_turn(user_id, chat_id, question).await;
        };

        let _turn = locks.acquire(&SessionKey::new(user_id, chat_id)).await;
        self.run_turn(user_id, chat_id, question).await
    }

    async fn run_turn(
        &self,
        user_id: &str,
        chat_id: &str,
        question: &str,
    ) -> Result<Vec<Message>, ServiceError> {
        info!(user_id, chat_id, "Processing search");

        let title = default_chat_title(chat_id);
        self.repo.get_or_create(user_id, chat_id, Some(&title)).await?;

        let chat = self
            .repo
            .append_message(user_id, chat_id, Message::user(question))
            .await?;

        // Everything before the question we just appended.
        let prior = chat.messages.len().saturating_sub(1);
        let history = &chat.messages[..prior];

        let answer = match self.generator.generate(question, history).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(user_id, chat_id, error = %e, "Answer generation failed");
                return Err(e.into());
            }
        };

        let chat = self
            .repo
            .append_message(user_id, chat_id, Message::assistant(answer))
            .await?;

        info!(user_id, chat_id, message_count = chat.messages.len(), "Search completed");
        Ok(chat.messages)
    }

    // --- Chat management ---

    /// Create a chat explicitly. Fails with `AlreadyExists` on a taken id.
    pub async fn create_chat(
        &self,
        user_id: &str,
        chat_id: &str,
        title: Option<&str>,
    ) -> Result<Chat, ServiceError> {
        let title = title.map_or_else(|| default_chat_title(chat_id), str::to_string);
        Ok(self.repo.create(Chat::new(user_id, chat_id, title)).await?)
    }

    pub async fn get_chat(&self, user_id: &str, chat_id: &str) -> Result<Option<Chat>, ServiceError> {
        Ok(self.repo.get(user_id, chat_id).await?)
    }

    /// List a user's chats, optionally only those whose title contains `title_query`.
    pub async fn list_user_chats(
        &self,
        user_id: &str,
        title_query: Option<&str>,
    ) -> Result<Vec<Chat>, ServiceError> {
        let chats = match title_query {
            Some(query) => self.repo.search_by_title(query, Some(user_id)).await?,
            None => self.repo.list_by_user(user_id).await?,
        };
        Ok(chats)
    }

    pub async fn update_chat_title(
        &self,
        user_id: &str,
        chat_id: &str,
        title: &str,
    ) -> Result<Chat, ServiceError> {
        Ok(self.repo.update_title(user_id, chat_id, title).await?)
    }

    pub async fn delete_chat(&self, user_id: &str, chat_id: &str) -> Result<bool, ServiceError> {
        let deleted = self.repo.delete(user_id, chat_id).await?;
        if !deleted {
            warn!(user_id, chat_id, "Chat not found for deletion");
        }
        Ok(deleted)
    }

    pub async fn delete_user_chats(&self, user_id: &str) -> Result<usize, ServiceError> {
        Ok(self.repo.delete_user_chats(user_id).await?)
    }

    pub async fn stats(&self) -> Result<ChatStats, ServiceError> {
        Ok(ChatStats {
            users: self.repo.count_users().await?,
            chats: self.repo.count_chats(None).await?,
        })
    }
}
