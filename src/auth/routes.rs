//! Authentication and profile routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// # Routes
/// - `POST /api/auth/register` - Create an account and return a token
/// - `POST /api/auth/login` - Exchange credentials for a token
/// - `POST /api/auth/logout` - Acknowledge logout (tokens are stateless)
/// - `POST /api/auth/change-password` - Replace the password
/// - `GET|PUT /api/profile` - Read or update the current user's profile
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/change-password", post(handlers::change_password))
        .route(
            "/api/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
}
