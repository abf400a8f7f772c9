//! Middleware for the Smart Task API

pub mod auth;

pub use auth::{require_auth, AdminUser, AuthenticatedUser};
