// src/resumes/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Create the resumes router
pub fn resumes_routes() -> Router {
    Router::new()
        .route(
            "/api/resumes",
            get(handlers::list_resumes).post(handlers::upload_resume),
        )
        // Static segments before `:id`
        .route("/api/resumes/targets", get(handlers::list_target_resumes))
        .route("/api/resumes/jobs", get(handlers::list_target_resumes))
        .route(
            "/api/resumes/:id",
            get(handlers::get_resume)
                .put(handlers::update_resume)
                .delete(handlers::delete_resume),
        )
        .route("/api/resumes/:id/tailor", post(handlers::tailor_resume))
        .route(
            "/api/resumes/:id/cover-letters",
            get(handlers::get_cover_letters).post(handlers::generate_cover_letters),
        )
        .route(
            "/api/resumes/:id/recommended-skills",
            get(handlers::get_recommended_skills),
        )
        // Rendering
        .route("/api/resumes/:id/preview", get(handlers::preview_resume))
        .route("/api/resumes/:id/preview-html", get(handlers::preview_resume_html))
        .route("/api/resumes/:id/preview-pdf", get(handlers::preview_resume_pdf))
        .route("/api/resumes/:id/download", get(handlers::download_resume))
        .route(
            "/api/profile/similar-jobs-toggle",
            get(handlers::get_similar_jobs_toggle).post(handlers::set_similar_jobs_toggle),
        )
}
