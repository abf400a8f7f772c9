//! Token service: issue and verify access/refresh credentials.
//!
//! Every credential handed to a client is a signed token sealed by the
//! [`PayloadCipher`]. Verification never errors on a bad credential; it
//! returns a [`TokenVerdict`]. Only ledger failures surface as errors.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, warn};

use super::cipher::PayloadCipher;
use super::errors::{CryptoError, IssueError, StoreError};
use super::jwt::{TokenKind, TokenSigner, TokenVerdict};
use super::store::{fingerprint, RefreshTokenStore};
use crate::config::AuthConfig;
use crate::models::UserId;

pub struct TokenService {
    cipher: Arc<PayloadCipher>,
    access: TokenSigner,
    refresh: TokenSigner,
    store: Arc<dyn RefreshTokenStore>,
}

impl TokenService {
    pub fn new(
        cipher: Arc<PayloadCipher>,
        access: TokenSigner,
        refresh: TokenSigner,
        store: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        Self {
            cipher,
            access,
            refresh,
            store,
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        store: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self, CryptoError> {
        let cipher = PayloadCipher::from_pem(&config.public_key_pem, &config.private_key_pem)?;
        Ok(Self::new(
            Arc::new(cipher),
            TokenSigner::new(
                TokenKind::Access,
                &config.access.secret,
                config.access.ttl_seconds,
            ),
            TokenSigner::new(
                TokenKind::Refresh,
                &config.refresh.secret,
                config.refresh.ttl_seconds,
            ),
            store,
        ))
    }

    pub fn access_ttl_seconds(&self) -> u64 {
        self.access.ttl_seconds()
    }

    pub fn refresh_ttl_seconds(&self) -> u64 {
        self.refresh.ttl_seconds()
    }

    pub async fn issue_access(&self, subject: &UserId) -> Result<String, IssueError> {
        self.issue_access_at(subject, Utc::now())
    }

    /// Issue an access token as if minted at `issued_at`.
    pub fn issue_access_at(
        &self,
        subject: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        if subject.is_empty() {
            return Err(IssueError::EmptySubject);
        }

        let signed = self.access.sign(subject, issued_at)?;
        Ok(self.cipher.encrypt(&signed)?)
    }

    pub fn verify_access(&self, envelope: &str) -> TokenVerdict {
        match self.cipher.decrypt(envelope) {
            Ok(signed) => self.access.verify(&signed),
            Err(_) => TokenVerdict::Invalid,
        }
    }

    /// Issue a refresh token and record it as the subject's only valid one.
    ///
    /// Nothing is returned unless the ledger write succeeded.
    pub async fn issue_refresh(&self, subject: &UserId) -> Result<String, IssueError> {
        self.issue_refresh_at(subject, Utc::now()).await
    }

    pub async fn issue_refresh_at(
        &self,
        subject: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        if subject.is_empty() {
            return Err(IssueError::EmptySubject);
        }

        let signed = self.refresh.sign(subject, issued_at)?;
        let envelope = self.cipher.encrypt(&signed)?;
        self.store
            .upsert(subject, &fingerprint(&signed))
            .await
            .map_err(|err| {
                error!(user_id = %subject, error = %err, "cannot store refresh token");
                err
            })?;

        Ok(envelope)
    }

    /// Verify a refresh token and consume its ledger entry.
    ///
    /// A correctly signed token whose entry is gone (already used, superseded
    /// or revoked) is reported as [`TokenVerdict::Replayed`].
    pub async fn verify_refresh(&self, envelope: &str) -> Result<TokenVerdict, StoreError> {
        let signed = match self.cipher.decrypt(envelope) {
            Ok(signed) => signed,
            Err(_) => return Ok(TokenVerdict::Invalid),
        };

        let subject = match self.refresh.verify(&signed) {
            TokenVerdict::Valid(subject) => subject,
            verdict => return Ok(verdict),
        };

        if self.store.take(&subject, &fingerprint(&signed)).await? {
            Ok(TokenVerdict::Valid(subject))
        } else {
            warn!(user_id = %subject, "refresh token reuse or superseded token presented");
            Ok(TokenVerdict::Replayed)
        }
    }

    pub async fn revoke_refresh(&self, subject: &UserId) -> Result<bool, StoreError> {
        self.store.revoke(subject).await
    }
}
