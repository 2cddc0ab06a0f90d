//! Chat and message types.
//!
//! A `Chat` is addressed by the pair (user_id, chat_id). The chat_id is only
//! unique within its user's namespace; there is no global identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Author of a message within a chat.
///
/// Deserialization is lenient: any role other than `user` or `assistant`
/// becomes [`MessageRole::User`] and a warning is logged. Use `FromStr` for
/// strict parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Parse a role, falling back to `User` for anything unrecognized.
    ///
    /// This is the single place where unknown roles are normalized.
    pub fn from_lenient(s: &str) -> Self {
        match s.parse() {
            Ok(role) => role,
            Err(_) => {
                tracing::warn!(role = %s, "Unknown message role, treating as user");
                MessageRole::User
            }
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

impl From<String> for MessageRole {
    fn from(s: String) -> Self {
        MessageRole::from_lenient(&s)
    }
}

/// A single message within a chat. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// A conversation between one user and the assistant.
///
/// `updated_at` is never earlier than `created_at` and moves forward on every
/// title change or message append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Build an empty chat stamped with the current time.
    pub fn new(
        user_id: impl Into<String>,
        chat_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            chat_id: chat_id.into(),
            user_id: user_id.into(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The (user_id, chat_id) pair addressing this chat.
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.user_id, &self.chat_id)
    }

    /// Reset both timestamps to now. Used when a store accepts a new chat.
    pub fn stamp_created(&mut self) {
        let now = Utc::now();
        self.created_at = now;
        self.updated_at = now;
    }

    /// Refresh `updated_at`, clamped so it never precedes `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }
}

/// Default title for a chat created implicitly by its first question.
pub fn default_chat_title(chat_id: &str) -> String {
    format!("Chat {chat_id}")
}

/// The sole addressing scheme for chats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub user_id: String,
    pub chat_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            chat_id: chat_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.chat_id)
    }
}
