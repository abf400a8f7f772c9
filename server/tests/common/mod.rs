#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};

use smart_task_server::app_state::AppState;
use smart_task_server::auth::{generate_key_pair, KeyPairPem, MemoryRefreshTokenStore};
use smart_task_server::config::{AppEnv, AuthConfig, TokenConfig};
use smart_task_server::models::{NewUser, User, UserId, UserRole};
use smart_task_server::services::{MemoryUserStore, UserService, UserStore};
use smart_task_server::websocket::ConnectionDirectory;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";
pub const PASSWORD: &str = "correct horse battery";

fn keys() -> &'static KeyPairPem {
    static KEYS: OnceLock<KeyPairPem> = OnceLock::new();
    KEYS.get_or_init(|| generate_key_pair(1024).unwrap())
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        environment: AppEnv::Development,
        access: TokenConfig {
            cookie_name: ACCESS_COOKIE.to_string(),
            secret: "integration-access-secret".to_string(),
            ttl_seconds: 900,
        },
        refresh: TokenConfig {
            cookie_name: REFRESH_COOKIE.to_string(),
            secret: "integration-refresh-secret".to_string(),
            ttl_seconds: 1_209_600,
        },
        public_key_pem: keys().public_pem.clone(),
        private_key_pem: keys().private_pem.clone(),
    }
}

pub struct Harness {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub refresh_tokens: Arc<MemoryRefreshTokenStore>,
}

impl Harness {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let refresh_tokens = Arc::new(MemoryRefreshTokenStore::new());
        let state = AppState::build(
            &auth_config(),
            UserService::with_hash_cost(users.clone(), 4),
            refresh_tokens.clone(),
            ConnectionDirectory::new(),
        )
        .unwrap();

        Self {
            state,
            users,
            refresh_tokens,
        }
    }

    pub async fn seed(&self, name: &str, role: UserRole) -> User {
        self.users
            .create(NewUser {
                name: name.to_string(),
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
                role,
            })
            .await
            .unwrap()
    }

    pub async fn access_token(&self, subject: &UserId) -> String {
        self.state
            .sessions
            .tokens()
            .issue_access(subject)
            .await
            .unwrap()
    }

    pub fn expired_access_token(&self, subject: &UserId) -> String {
        let tokens = self.state.sessions.tokens();
        let issued_at = Utc::now() - Duration::seconds(tokens.access_ttl_seconds() as i64 + 5);
        tokens.issue_access_at(subject, issued_at).unwrap()
    }

    pub async fn refresh_token(&self, subject: &UserId) -> String {
        self.state
            .sessions
            .tokens()
            .issue_refresh(subject)
            .await
            .unwrap()
    }
}

pub fn cookie_header(access: Option<&str>, refresh: Option<&str>) -> String {
    let mut pairs = Vec::new();
    if let Some(access) = access {
        pairs.push(format!("{ACCESS_COOKIE}={access}"));
    }
    if let Some(refresh) = refresh {
        pairs.push(format!("{REFRESH_COOKIE}={refresh}"));
    }
    pairs.join("; ")
}

pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Value of the named cookie among `Set-Cookie` headers.
pub fn set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    set_cookies(headers).into_iter().find_map(|cookie| {
        let (pair, _) = cookie.split_once(';').unwrap_or((cookie.as_str(), ""));
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}
