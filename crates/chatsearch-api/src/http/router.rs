//! Axum router configuration with middleware.
//!
//! Middleware: CORS (any origin), request tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        // Question/answer turns
        .route("/search", post(handlers::search::post_search))
        // Chat management
        .route(
            "/searches/{user_id}",
            get(handlers::chats::list_user_chats).delete(handlers::chats::delete_user_chats),
        )
        .route(
            "/searches/{user_id}/chats",
            post(handlers::chats::create_chat),
        )
        .route(
            "/searches/{user_id}/chats/{chat_id}",
            get(handlers::chats::get_chat)
                .delete(handlers::chats::delete_chat)
                .patch(handlers::chats::update_chat_title),
        )
        .route("/stats", get(handlers::chats::get_stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
