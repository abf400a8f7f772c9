use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::SessionIssuer;
use crate::error::ApiError;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{ApiResponse, Identity, LoginRequest, RegisterRequest, UserId, UserResponse};

/// Register a new user and log them in
pub async fn register_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<UserResponse>>), ApiError> {
    request.validate()?;

    let user = state.users.register(request).await?;
    let jar = open_session(&state.sessions, jar, &user.id).await?;

    Ok((StatusCode::CREATED, jar, Json(ApiResponse::ok(user.into()))))
}

/// Log in with email and password
pub async fn login_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<UserResponse>>), ApiError> {
    request.validate()?;

    let user = state
        .users
        .verify_credentials(&request.email, &request.password)
        .await?;
    let jar = open_session(&state.sessions, jar, &user.id).await?;

    Ok((jar, Json(ApiResponse::ok(user.into()))))
}

/// Clear both credential cookies and revoke the refresh token
pub async fn logout_user(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<Value>>) {
    let mut jar = jar;
    if let Err(err) = state.sessions.terminate_session(&mut jar, &identity.id).await {
        error!(user_id = %identity.id, error = %err, "cannot revoke refresh token on logout");
    }

    (
        jar,
        Json(ApiResponse::ok(json!({ "message": "Logged Out Successfully" }))),
    )
}

pub async fn get_my_profile(
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Json<ApiResponse<Identity>> {
    Json(ApiResponse::ok(identity))
}

/// Admin only: fetch any user
pub async fn get_single_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .users
        .find(&user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(ApiResponse::ok(user.into())))
}

async fn open_session(
    sessions: &Arc<SessionIssuer>,
    jar: CookieJar,
    subject: &UserId,
) -> Result<CookieJar, ApiError> {
    let mut jar = jar;
    if !sessions.establish_session(&mut jar, subject).await {
        return Err(ApiError::Internal("Error while creating and setting tokens"));
    }
    Ok(jar)
}
