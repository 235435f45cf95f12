// src/search/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// # Routes
/// - `GET /api/search` - Semantic search over the user's resumes and jobs
/// - `GET /api/profile/stats` - Resume, job and embedding counts
pub fn search_routes() -> Router {
    Router::new()
        .route("/api/search", get(handlers::search))
        .route("/api/profile/stats", get(handlers::profile_stats))
}
