//! Shared fixtures for unit tests.

use async_trait::async_trait;
use std::sync::{Arc, OnceLock};

use crate::app_state::AppState;
use crate::auth::{
    generate_key_pair, KeyPairPem, MemoryRefreshTokenStore, RefreshTokenStore, StoreError,
};
use crate::models::UserId;
use crate::config::{AppEnv, AuthConfig, TokenConfig};
use crate::models::{NewUser, User, UserRole};
use crate::services::{MemoryUserStore, UserService, UserStore};
use crate::websocket::ConnectionDirectory;

// Small keys keep generation fast; OAEP-SHA256 still fits a 32 byte content key.
const TEST_KEY_BITS: usize = 1024;
pub const TEST_PASSWORD: &str = "correct horse battery";

pub fn test_keys() -> &'static KeyPairPem {
    static KEYS: OnceLock<KeyPairPem> = OnceLock::new();
    KEYS.get_or_init(|| generate_key_pair(TEST_KEY_BITS).unwrap())
}

pub fn other_test_keys() -> &'static KeyPairPem {
    static KEYS: OnceLock<KeyPairPem> = OnceLock::new();
    KEYS.get_or_init(|| generate_key_pair(TEST_KEY_BITS).unwrap())
}

pub fn auth_config() -> AuthConfig {
    let keys = test_keys();
    AuthConfig {
        environment: AppEnv::Development,
        access: TokenConfig {
            cookie_name: "accessToken".to_string(),
            secret: "access-secret-for-tests".to_string(),
            ttl_seconds: 900,
        },
        refresh: TokenConfig {
            cookie_name: "refreshToken".to_string(),
            secret: "refresh-secret-for-tests".to_string(),
            ttl_seconds: 1_209_600,
        },
        public_key_pem: keys.public_pem.clone(),
        private_key_pem: keys.private_pem.clone(),
    }
}

pub struct TestContext {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub refresh_tokens: Arc<MemoryRefreshTokenStore>,
}

impl TestContext {
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
}

pub async fn seed_user(users: &Arc<MemoryUserStore>, name: &str, role: UserRole) -> User {
    users
        .create(NewUser {
            name: name.to_string(),
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: bcrypt::hash(TEST_PASSWORD, 4).unwrap(),
            role,
        })
        .await
        .unwrap()
}

/// Ledger whose writes always fail. Reads consume as if the entry existed, so
/// a correctly signed refresh token still verifies.
pub struct UnavailableRefreshTokenStore;

#[async_trait]
impl RefreshTokenStore for UnavailableRefreshTokenStore {
    async fn upsert(&self, _subject: &UserId, _fingerprint: &str) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn take(&self, _subject: &UserId, _fingerprint: &str) -> Result<bool, StoreError> {
        Ok(true)
    }

    async fn revoke(&self, _subject: &UserId) -> Result<bool, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}
