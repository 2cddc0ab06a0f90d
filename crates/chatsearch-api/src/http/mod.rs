//! HTTP/REST API layer for chatsearch.
//!
//! Axum router over the chat service with CORS and request tracing.

pub mod error;
pub mod handlers;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;
