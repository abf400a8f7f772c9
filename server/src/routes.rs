//! Route definitions for the Smart Task API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::*;
use crate::middleware::require_auth;
use crate::websocket::ws_handler;

// User routes
pub fn user_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/v1/users/logout", get(logout_user))
        .route("/api/v1/users/my-profile", get(get_my_profile))
        .route("/api/v1/users/single/:user_id", get(get_single_user))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/api/v1/users/create", post(register_user))
        .route("/api/v1/users/login", post(login_user))
        .merge(protected)
}

// Notification routes
pub fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/notifications/push", post(push_notification))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

// Realtime routes; the handshake authenticates itself
pub fn realtime_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(user_routes(state.clone()))
        .merge(notification_routes(state.clone()))
        .merge(realtime_routes())
        .with_state(state)
}
