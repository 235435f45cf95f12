//! # Messages Module
//!
//! Outreach drafts (email, LinkedIn note, elevator pitch) generated from a
//! saved job and kept for later editing.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::messages_routes;
