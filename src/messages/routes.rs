// src/messages/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Create the outreach messages router
pub fn messages_routes() -> Router {
    Router::new()
        .route("/api/messages/generate", post(handlers::generate_message))
        .route("/api/messages", get(handlers::list_messages))
        .route(
            "/api/messages/:id",
            get(handlers::get_message)
                .put(handlers::update_message)
                .delete(handlers::delete_message),
        )
        .route("/api/messages/:id/copy", get(handlers::copy_message))
}
