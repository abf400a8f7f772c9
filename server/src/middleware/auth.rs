//! Request authentication middleware and identity extractors.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::auth::{authorize_role, Authenticator};
use crate::error::ApiError;
use crate::models::{Identity, UserRole};

/// Resolve the caller from cookies and attach their [`Identity`] to the request.
///
/// Cookies re-issued by a silent refresh are appended to the response unless
/// the inner handler already set the credential cookies itself (login, logout).
pub async fn require_auth(
    State(authenticator): State<Arc<Authenticator>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let mut refreshed = CookieJar::new();
    let identity = authenticator.authenticate(&jar, &mut refreshed).await?;

    request.extensions_mut().insert(identity);
    let response = next.run(request).await;
    let cookies = authenticator.sessions().cookies();
    let sets_credentials = sets_cookie(&response, cookies.access_name())
        || sets_cookie(&response, cookies.refresh_name());
    if sets_credentials {
        return Ok(response);
    }
    Ok((refreshed, response).into_response())
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split_once('='))
        .any(|(key, _)| key.trim() == name)
}

/// Identity attached by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Authenticated identity holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) = AuthenticatedUser::from_request_parts(parts, state).await?;
        authorize_role(&identity, UserRole::Admin)?;
        Ok(AdminUser(identity))
    }
}
