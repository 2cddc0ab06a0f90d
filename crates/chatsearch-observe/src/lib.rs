//! Observability for chatsearch: structured logging and span export.

pub mod tracing_setup;
