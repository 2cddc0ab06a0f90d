//! Chat CLI commands: ask, list, show, delete, stats.
//!
//! `ask` goes through the full chat service (store + LLM). The management
//! commands only need the store, so they work without an API key.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use serde_json::json;

use chatsearch_core::chat::repository::ChatRepository;
use chatsearch_infra::store::ChatStore;
use chatsearch_types::chat::{Message, MessageRole};
use chatsearch_types::config::StorageBackend;

use crate::state::AppState;

/// Run one question/answer turn and print the transcript.
///
/// # Examples
///
/// ```bash
/// chatsearch ask -u alice -c trip "What should I pack for Oslo in March?"
/// ```
pub async fn ask(state: &AppState, user_id: &str, chat_id: &str, question: &str, json: bool) -> Result<()> {
    let messages = state
        .chat_service
        .handle_search(user_id, chat_id, question)
        .await
        .with_context(|| format!("Question failed in chat '{chat_id}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "messages": messages }))?);
        return Ok(());
    }

    println!();
    print_transcript(&messages);
    Ok(())
}

/// List a user's chats in a table.
pub async fn list_chats(store: &ChatStore, user_id: &str, title: Option<&str>, json: bool) -> Result<()> {
    let chats = match title {
        Some(query) => store.search_by_title(query, Some(user_id)).await?,
        None => store.list_by_user(user_id).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    if chats.is_empty() {
        println!();
        println!(
            "  {} No chats found for '{}'. Start one with: {}",
            style("i").blue().bold(),
            style(user_id).cyan(),
            style(format!("chatsearch ask -u {user_id} -c <chat> <question>")).yellow()
        );
        memory_backend_hint(store);
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Chat").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for chat in &chats {
        table.add_row(vec![
            Cell::new(&chat.chat_id).fg(Color::Cyan),
            Cell::new(truncate(&chat.title, 40)).fg(Color::White),
            Cell::new(chat.messages.len().to_string()).fg(Color::White),
            Cell::new(chat.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
            Cell::new(chat.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Chats for '{}'", style(user_id).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} chat{}",
        style(chats.len()).bold(),
        if chats.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print one chat with all its messages.
pub async fn show_chat(store: &ChatStore, user_id: &str, chat_id: &str, json: bool) -> Result<()> {
    let Some(chat) = store.get(user_id, chat_id).await? else {
        memory_backend_hint(store);
        anyhow::bail!("Chat {chat_id} not found for user {user_id}");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&chat)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(&chat.title).cyan().bold(),
        style(format!("({}/{})", chat.user_id, chat.chat_id)).dim()
    );
    println!(
        "  {}",
        style(format!(
            "created {}  updated {}",
            chat.created_at.format("%Y-%m-%d %H:%M:%S"),
            chat.updated_at.format("%Y-%m-%d %H:%M:%S")
        ))
        .dim()
    );
    println!();
    print_transcript(&chat.messages);
    Ok(())
}

/// Delete one chat, or all of a user's chats.
pub async fn delete_chats(store: &ChatStore, user_id: &str, chat_id: Option<&str>, json: bool) -> Result<()> {
    let deleted = match chat_id {
        Some(chat_id) => {
            if !store.delete(user_id, chat_id).await? {
                anyhow::bail!("Chat {chat_id} not found for user {user_id}");
            }
            1
        }
        None => store.delete_user_chats(user_id).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "deleted_count": deleted }))?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Deleted {} chat{} for '{}'",
        style("✓").green().bold(),
        style(deleted).bold(),
        if deleted == 1 { "" } else { "s" },
        style(user_id).cyan()
    );
    println!();
    Ok(())
}

/// Print user and chat counts.
pub async fn stats(store: &ChatStore, json: bool) -> Result<()> {
    let users = store.count_users().await?;
    let chats = store.count_chats(None).await?;

    if json {
        let stats = json!({ "users": users, "chats": chats, "storage": store.backend().to_string() });
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Storage:").bold(), store.backend());
    println!("  {} {}", style("Users:").bold(), users);
    println!("  {} {}", style("Chats:").bold(), chats);
    println!();
    Ok(())
}

fn print_transcript(messages: &[Message]) {
    for message in messages {
        let speaker = match message.role {
            MessageRole::User => style("you").yellow().bold(),
            MessageRole::Assistant => style("assistant").cyan().bold(),
        };
        println!(
            "  {} {}",
            speaker,
            style(message.timestamp.format("%H:%M:%S").to_string()).dim()
        );
        for line in message.content.lines() {
            println!("    {line}");
        }
        println!();
    }
}

fn memory_backend_hint(store: &ChatStore) {
    if store.backend() == StorageBackend::Memory {
        println!(
            "  {}",
            style("The in-memory store starts empty on every run; set CHATSEARCH_STORAGE=sqlite to keep chats.")
                .dim()
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max.saturating_sub(3)) {
        Some((idx, _)) if text.chars().count() > max => format!("{}...", &text[..idx]),
        _ => text.to_string(),
    }
}
