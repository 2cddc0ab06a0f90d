//! Infrastructure layer for chatsearch.
//!
//! Implementations of the ports defined in `chatsearch-core`: the SQLite
//! chat store, OpenAI-compatible LLM providers, the runtime store selector,
//! and the configuration loader.

pub mod config;
pub mod llm;
pub mod sqlite;
pub mod store;
