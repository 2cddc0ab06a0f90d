//! Shared domain types for chatsearch.
//!
//! Chats, messages, configuration, LLM request shapes and the error
//! enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, tracing.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
