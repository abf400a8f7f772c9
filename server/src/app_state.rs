//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{
    Authenticator, CookieSettings, CryptoError, RefreshTokenStore, SessionIssuer, TokenService,
};
use crate::config::AuthConfig;
use crate::services::{UserService, UserStore};
use crate::websocket::{ConnectionDirectory, RealtimeBridge};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub sessions: Arc<SessionIssuer>,
    pub authenticator: Arc<Authenticator>,
    pub realtime: Arc<RealtimeBridge>,
}

impl AppState {
    pub fn new(
        users: Arc<UserService>,
        sessions: Arc<SessionIssuer>,
        authenticator: Arc<Authenticator>,
        realtime: Arc<RealtimeBridge>,
    ) -> Self {
        Self {
            users,
            sessions,
            authenticator,
            realtime,
        }
    }

    /// Wire the authentication core on top of the given stores.
    ///
    /// Fails only when the configured key pair cannot be loaded.
    pub fn build(
        config: &AuthConfig,
        users: UserService,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        directory: ConnectionDirectory,
    ) -> Result<Self, CryptoError> {
        let user_store: Arc<dyn UserStore> = users.store().clone();
        let tokens = Arc::new(TokenService::from_config(config, refresh_tokens)?);
        let sessions = Arc::new(SessionIssuer::new(
            tokens,
            CookieSettings::from_config(config),
        ));
        let authenticator = Arc::new(Authenticator::new(sessions.clone(), user_store));
        let realtime = Arc::new(RealtimeBridge::new(authenticator.clone(), directory));

        Ok(Self::new(Arc::new(users), sessions, authenticator, realtime))
    }
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for Arc<SessionIssuer> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<Authenticator> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.authenticator.clone()
    }
}

impl FromRef<AppState> for Arc<RealtimeBridge> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.realtime.clone()
    }
}
