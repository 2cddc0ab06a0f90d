//! Liveness endpoints.

use axum::Json;
use serde_json::{json, Value};

/// GET / - Greeting.
pub async fn root() -> Json<Value> {
    tracing::info!("Root endpoint accessed");
    Json(json!({ "message": "Hello, World!" }))
}

/// Version reported by `/health`. Tracks the HTTP contract, not the crate.
const API_VERSION: &str = "1.0.0";

/// GET /health - Static status payload.
pub async fn health_check() -> Json<Value> {
    tracing::debug!("Health check endpoint accessed");
    Json(json!({
        "status": "healthy",
        "service": "AI Chatbot Search API",
        "version": API_VERSION,
    }))
}
