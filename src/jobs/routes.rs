// src/jobs/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Create the jobs router
pub fn jobs_routes() -> Router {
    Router::new()
        // Specific routes before `:id`
        .route("/api/jobs/search", post(handlers::search_jobs))
        .route("/api/jobs", get(handlers::list_jobs).post(handlers::create_job))
        .route(
            "/api/jobs/:id",
            get(handlers::get_job).delete(handlers::delete_job),
        )
        .route("/api/jobs/:id/analysis", get(handlers::analyze_job))
        .route("/api/jobs/:id/related", post(handlers::find_related_jobs))
        // Legacy form endpoints
        .route("/jobs/save", post(handlers::legacy_save_job))
        .route("/jobs/delete/:id", post(handlers::legacy_delete_job))
        .route("/jobs/analyze/:id", get(handlers::legacy_analyze_job))
}
