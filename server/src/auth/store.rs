//! Refresh token ledger: one active refresh token per user.
//!
//! Entries hold a SHA-256 fingerprint of the signed token, never the token
//! itself. Consuming an entry is a destructive read, so a refresh token can be
//! exchanged at most once even when two requests race on it.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::errors::StoreError;
use crate::models::UserId;

/// Fingerprint stored in place of the signed refresh token.
pub fn fingerprint(signed_token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(signed_token.as_bytes()))
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert or overwrite the entry for `subject`.
    async fn upsert(&self, subject: &UserId, fingerprint: &str) -> Result<(), StoreError>;

    /// Atomically delete the entry if it holds `fingerprint`. Returns whether
    /// an entry was consumed.
    async fn take(&self, subject: &UserId, fingerprint: &str) -> Result<bool, StoreError>;

    /// Drop whatever entry `subject` has. Returns whether one existed.
    async fn revoke(&self, subject: &UserId) -> Result<bool, StoreError>;
}

/// Postgres backed ledger
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn upsert(&self, subject: &UserId, fingerprint: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET token = EXCLUDED.token, updated_at = NOW()
            "#,
        )
        .bind(subject)
        .bind(fingerprint)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn take(&self, subject: &UserId, fingerprint: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND token = $2")
            .bind(subject)
            .bind(fingerprint)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, subject: &UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(subject)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-process ledger used by tests and single-node development setups.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenStore {
    entries: Mutex<HashMap<UserId, String>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, subject: &UserId) -> bool {
        self.entries.lock().await.contains_key(subject)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn upsert(&self, subject: &UserId, fingerprint: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .await
            .insert(*subject, fingerprint.to_string());
        Ok(())
    }

    async fn take(&self, subject: &UserId, fingerprint: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get(subject) {
            Some(stored) if stored == fingerprint => {
                entries.remove(subject);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, subject: &UserId) -> Result<bool, StoreError> {
        Ok(self.entries.lock().await.remove(subject).is_some())
    }
}
