//! Chat storage abstraction and conversation orchestration.
//!
//! `ChatRepository` is the store port; `InMemoryChatRepository` is the
//! process-local implementation. `ChatService` drives question/answer turns
//! against any repository and `AnswerGenerator`.

pub mod generator;
pub mod locks;
pub mod memory;
pub mod repository;
pub mod service;
