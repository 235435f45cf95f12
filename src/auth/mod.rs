//! # Auth Module
//!
//! Account registration, password login, JWT issuance and the
//! `AuthedUser` extractor used by every protected route.

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod validators;


pub use extractors::AuthedUser;
pub use routes::auth_routes;
