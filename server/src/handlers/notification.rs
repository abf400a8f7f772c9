use axum::{extract::State, Json};
use serde_json::json;
use tracing::debug;
use validator::Validate;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::{ApiResponse, PushNotificationRequest, PushNotificationResponse};
use crate::websocket::PushEvent;

/// Admin only: push a notification to a user's live connection
pub async fn push_notification(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<PushNotificationRequest>,
) -> Result<Json<ApiResponse<PushNotificationResponse>>, ApiError> {
    request.validate()?;

    let event = PushEvent::notification(json!({
        "title": request.title,
        "description": request.description,
        "from": admin.id,
    }));
    let delivered = state
        .realtime
        .directory()
        .emit(&request.user_id, event)
        .await;
    debug!(user_id = %request.user_id, delivered, "notification pushed");

    Ok(Json(ApiResponse::ok(PushNotificationResponse { delivered })))
}
