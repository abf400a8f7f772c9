//! API handlers for the Smart Task backend

pub mod notification;
pub mod user;

pub use notification::push_notification;
pub use user::{get_my_profile, get_single_user, login_user, logout_user, register_user};

pub async fn root() -> &'static str {
    "Smart Task API Server"
}

pub async fn health_check() -> &'static str {
    "OK"
}
