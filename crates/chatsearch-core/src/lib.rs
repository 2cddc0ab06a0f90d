//! Business logic and trait definitions for chatsearch.
//!
//! This crate defines the ports (`ChatRepository`, `LlmProvider`,
//! `AnswerGenerator`) that the infrastructure layer implements, plus the
//! `ChatService` that drives one question/answer turn. It never depends on
//! `chatsearch-infra` or any database or HTTP crate.

pub mod chat;
pub mod llm;
