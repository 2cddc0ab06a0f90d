//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `chatsearch-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, multi-statement writes
//! inside a transaction on the single writer connection.

use chatsearch_core::chat::repository::{ChatRepository, sort_chats, title_matches};
use chatsearch_types::chat::{Chat, Message, MessageRole, default_chat_title};
use chatsearch_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::{Executor, Row, Sqlite};
use tracing::{debug, info, warn};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatRow {
    user_id: String,
    chat_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            chat_id: row.try_get("chat_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chat(self, messages: Vec<Message>) -> Result<Chat, RepositoryError> {
        Ok(Chat {
            chat_id: self.chat_id,
            user_id: self.user_id,
            title: self.title,
            messages,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    role: String,
    content: String,
    timestamp: String,
}

impl MessageRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        Ok(Message {
            role: MessageRole::from_lenient(&self.role),
            content: self.content,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            warn!(error = %e, "SQLite connection unavailable");
            RepositoryError::Connection
        }
        e => RepositoryError::Query(e.to_string()),
    }
}

/// Load a chat's messages in order.
///
/// Writers pass their open transaction so the result reflects exactly what
/// that transaction wrote, not appends committed after it.
async fn load_messages<'e, E>(
    executor: E,
    user_id: &str,
    chat_id: &str,
) -> Result<Vec<Message>, RepositoryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT role, content, timestamp FROM chat_messages WHERE user_id = ? AND chat_id = ? ORDER BY position ASC",
    )
    .bind(user_id)
    .bind(chat_id)
    .fetch_all(executor)
    .await
    .map_err(query_err)?;

    rows.iter()
        .map(|row| MessageRow::from_row(row).map_err(query_err)?.into_message())
        .collect()
}

/// Decode chat rows before any further await.
fn chat_rows(rows: &[SqliteRow]) -> Result<Vec<ChatRow>, RepositoryError> {
    rows.iter()
        .map(|row| ChatRow::from_row(row).map_err(query_err))
        .collect()
}

/// Turn chat rows into full chats (messages included), in listing order.
async fn hydrate(pool: &SqlitePool, rows: Vec<ChatRow>) -> Result<Vec<Chat>, RepositoryError> {
    let mut chats = Vec::with_capacity(rows.len());
    for chat_row in rows {
        let messages = load_messages(pool, &chat_row.user_id, &chat_row.chat_id).await?;
        chats.push(chat_row.into_chat(messages)?);
    }
    sort_chats(&mut chats);
    Ok(chats)
}

async fn fetch_chat(
    pool: &SqlitePool,
    user_id: &str,
    chat_id: &str,
) -> Result<Option<Chat>, RepositoryError> {
    let row = sqlx::query("SELECT * FROM chats WHERE user_id = ? AND chat_id = ?")
        .bind(user_id)
        .bind(chat_id)
        .fetch_optional(pool)
        .await
        .map_err(query_err)?;

    let Some(chat_row) = row
        .map(|row| ChatRow::from_row(&row).map_err(query_err))
        .transpose()?
    else {
        return Ok(None);
    };

    let messages = load_messages(pool, user_id, chat_id).await?;
    Ok(Some(chat_row.into_chat(messages)?))
}

/// Read a chat header (no messages) inside an open transaction.
async fn lock_chat(
    conn: &mut SqliteConnection,
    user_id: &str,
    chat_id: &str,
) -> Result<Option<Chat>, RepositoryError> {
    let row = sqlx::query("SELECT * FROM chats WHERE user_id = ? AND chat_id = ?")
        .bind(user_id)
        .bind(chat_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(query_err)?;

    row.map(|row| ChatRow::from_row(&row).map_err(query_err)?.into_chat(Vec::new()))
        .transpose()
}

async fn insert_message(
    conn: &mut SqliteConnection,
    user_id: &str,
    chat_id: &str,
    position: i64,
    message: &Message,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"INSERT INTO chat_messages (user_id, chat_id, position, role, content, timestamp)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(user_id)
    .bind(chat_id)
    .bind(position)
    .bind(message.role.to_string())
    .bind(&message.content)
    .bind(format_datetime(&message.timestamp))
    .execute(&mut *conn)
    .await
    .map_err(query_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create(&self, mut chat: Chat) -> Result<Chat, RepositoryError> {
        chat.stamp_created();

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let inserted = sqlx::query(
            r#"INSERT INTO chats (user_id, chat_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&chat.user_id)
        .bind(&chat.chat_id)
        .bind(&chat.title)
        .bind(format_datetime(&chat.created_at))
        .bind(format_datetime(&chat.updated_at))
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                warn!(user_id = %chat.user_id, chat_id = %chat.chat_id, "Chat already exists");
                return Err(RepositoryError::already_exists(&chat.user_id, &chat.chat_id));
            }
            return Err(query_err(e));
        }

        for (position, message) in chat.messages.iter().enumerate() {
            insert_message(&mut tx, &chat.user_id, &chat.chat_id, position as i64, message).await?;
        }

        tx.commit().await.map_err(query_err)?;
        info!(user_id = %chat.user_id, chat_id = %chat.chat_id, "Created chat");
        Ok(chat)
    }

    async fn get(&self, user_id: &str, chat_id: &str) -> Result<Option<Chat>, RepositoryError> {
        let chat = fetch_chat(&self.pool.reader, user_id, chat_id).await?;
        if chat.is_none() {
            debug!(user_id, chat_id, "Chat not found");
        }
        Ok(chat)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Chat>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM chats WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let chats = hydrate(&self.pool.reader, chat_rows(&rows)?).await?;
        debug!(user_id, count = chats.len(), "Listed user chats");
        Ok(chats)
    }

    async fn update_title(
        &self,
        user_id: &str,
        chat_id: &str,
        title: &str,
    ) -> Result<Chat, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let Some(mut chat) = lock_chat(&mut tx, user_id, chat_id).await? else {
            warn!(user_id, chat_id, "Cannot update title, chat not found");
            return Err(RepositoryError::not_found(user_id, chat_id));
        };

        chat.set_title(title);
        sqlx::query("UPDATE chats SET title = ?, updated_at = ? WHERE user_id = ? AND chat_id = ?")
            .bind(&chat.title)
            .bind(format_datetime(&chat.updated_at))
            .bind(user_id)
            .bind(chat_id)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        chat.messages = load_messages(&mut *tx, user_id, chat_id).await?;
        tx.commit().await.map_err(query_err)?;

        info!(user_id, chat_id, title, "Updated chat title");
        Ok(chat)
    }

    async fn append_message(
        &self,
        user_id: &str,
        chat_id: &str,
        message: Message,
    ) -> Result<Chat, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let Some(mut chat) = lock_chat(&mut tx, user_id, chat_id).await? else {
            warn!(user_id, chat_id, "Cannot add message, chat not found");
            return Err(RepositoryError::not_found(user_id, chat_id));
        };

        let position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM chat_messages WHERE user_id = ? AND chat_id = ?",
        )
        .bind(user_id)
        .bind(chat_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?;

        insert_message(&mut tx, user_id, chat_id, position, &message).await?;

        chat.touch();
        sqlx::query("UPDATE chats SET updated_at = ? WHERE user_id = ? AND chat_id = ?")
            .bind(format_datetime(&chat.updated_at))
            .bind(user_id)
            .bind(chat_id)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        chat.messages = load_messages(&mut *tx, user_id, chat_id).await?;
        tx.commit().await.map_err(query_err)?;
        info!(user_id, chat_id, message_count = chat.messages.len(), "Added message to chat");
        Ok(chat)
    }

    async fn delete(&self, user_id: &str, chat_id: &str) -> Result<bool, RepositoryError> {
        // Messages go with the chat via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM chats WHERE user_id = ? AND chat_id = ?")
            .bind(user_id)
            .bind(chat_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            warn!(user_id, chat_id, "Cannot delete chat, not found");
            return Ok(false);
        }

        info!(user_id, chat_id, "Deleted chat");
        Ok(true)
    }

    async fn get_or_create(
        &self,
        user_id: &str,
        chat_id: &str,
        title: Option<&str>,
    ) -> Result<Chat, RepositoryError> {
        let title = title.map_or_else(|| default_chat_title(chat_id), str::to_string);
        let now = format_datetime(&Utc::now());

        let result = sqlx::query(
            r#"INSERT OR IGNORE INTO chats (user_id, chat_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(user_id)
        .bind(chat_id)
        .bind(&title)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 1 {
            info!(user_id, chat_id, "Created new chat");
        } else {
            debug!(user_id, chat_id, "Retrieved existing chat");
        }

        fetch_chat(&self.pool.writer, user_id, chat_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(user_id, chat_id))
    }

    async fn delete_user_chats(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM chats WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        let deleted = result.rows_affected() as usize;
        if deleted == 0 {
            debug!(user_id, "No chats to delete");
        } else {
            info!(user_id, deleted, "Deleted all chats for user");
        }
        Ok(deleted)
    }

    async fn list_all(&self) -> Result<Vec<Chat>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM chats")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let chats = hydrate(&self.pool.reader, chat_rows(&rows)?).await?;
        debug!(count = chats.len(), "Listed all chats");
        Ok(chats)
    }

    async fn count_chats(&self, user_id: Option<&str>) -> Result<usize, RepositoryError> {
        let count: i64 = match user_id {
            Some(user_id) => sqlx::query_scalar("SELECT COUNT(*) FROM chats WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool.reader)
                .await
                .map_err(query_err)?,
            None => sqlx::query_scalar("SELECT COUNT(*) FROM chats")
                .fetch_one(&self.pool.reader)
                .await
                .map_err(query_err)?,
        };
        Ok(count as usize)
    }

    async fn count_users(&self) -> Result<usize, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM chats")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM chats")
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        let total = result.rows_affected() as usize;
        warn!(total, "Cleared all chats from repository");
        Ok(total)
    }

    async fn search_by_title(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<Chat>, RepositoryError> {
        // Match in Rust so case folding agrees with the in-memory store.
        let rows = match user_id {
            Some(user_id) => sqlx::query("SELECT * FROM chats WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool.reader)
                .await,
            None => sqlx::query("SELECT * FROM chats")
                .fetch_all(&self.pool.reader)
                .await,
        }
        .map_err(query_err)?;

        let matching: Vec<ChatRow> = chat_rows(&rows)?
            .into_iter()
            .filter(|row| title_matches(&row.title, query))
            .collect();

        let chats = hydrate(&self.pool.reader, matching).await?;
        debug!(query, count = chats.len(), "Searched chats by title");
        Ok(chats)
    }
}
