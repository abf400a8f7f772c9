//! Signed identity claims.
//!
//! Access and refresh tokens are independent signing contexts: each has its own
//! secret, lifetime and audience, so one can never validate as the other.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::errors::RejectReason;
use crate::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn audience(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

/// Outcome of verifying a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerdict {
    Valid(UserId),
    Expired,
    Invalid,
    /// Signature was fine but the refresh ledger no longer holds the token.
    Replayed,
}

impl TokenVerdict {
    pub fn subject(&self) -> Option<&UserId> {
        match self {
            TokenVerdict::Valid(subject) => Some(subject),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            TokenVerdict::Valid(_) => None,
            TokenVerdict::Expired => Some(RejectReason::Expired),
            TokenVerdict::Invalid => Some(RejectReason::Invalid),
            TokenVerdict::Replayed => Some(RejectReason::Replayed),
        }
    }
}

/// One signing context: secret, lifetime and audience.
pub struct TokenSigner {
    kind: TokenKind,
    ttl_seconds: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("kind", &self.kind)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(kind: TokenKind, secret: &str, ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(&[kind.audience()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Self {
            kind,
            ttl_seconds,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn sign(
        &self,
        subject: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = u64::try_from(issued_at.timestamp()).unwrap_or(0);
        let claims = Claims {
            sub: subject.to_string(),
            aud: self.kind.audience().to_string(),
            iat,
            exp: iat.saturating_add(self.ttl_seconds),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    pub fn verify(&self, token: &str) -> TokenVerdict {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => match data.claims.sub.parse::<UserId>() {
                Ok(subject) if !subject.is_empty() => TokenVerdict::Valid(subject),
                _ => TokenVerdict::Invalid,
            },
            Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => TokenVerdict::Expired,
            Err(_) => TokenVerdict::Invalid,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_token_verifies_to_its_subject() {
        let signer = TokenSigner::new(TokenKind::Access, "access-secret", 60);
        let subject = UserId::random();

        let token = signer.sign(&subject, Utc::now()).unwrap();

        assert_eq!(signer.verify(&token), TokenVerdict::Valid(subject));
    }

    #[test]
    fn token_past_its_ttl_is_expired() {
        let signer = TokenSigner::new(TokenKind::Access, "access-secret", 60);
        let token = signer
            .sign(&UserId::random(), Utc::now() - Duration::seconds(61))
            .unwrap();

        assert_eq!(signer.verify(&token), TokenVerdict::Expired);
    }

    #[test]
    fn contexts_never_cross_validate() {
        let access = TokenSigner::new(TokenKind::Access, "access-secret", 60);
        let refresh = TokenSigner::new(TokenKind::Refresh, "refresh-secret", 600);
        let subject = UserId::random();

        let access_token = access.sign(&subject, Utc::now()).unwrap();
        let refresh_token = refresh.sign(&subject, Utc::now()).unwrap();

        assert_eq!(refresh.verify(&access_token), TokenVerdict::Invalid);
        assert_eq!(access.verify(&refresh_token), TokenVerdict::Invalid);
    }

    #[test]
    fn same_secret_different_audience_is_rejected() {
        let access = TokenSigner::new(TokenKind::Access, "shared", 60);
        let refresh = TokenSigner::new(TokenKind::Refresh, "shared", 60);

        let token = refresh.sign(&UserId::random(), Utc::now()).unwrap();

        assert_eq!(access.verify(&token), TokenVerdict::Invalid);
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let signer = TokenSigner::new(TokenKind::Refresh, "refresh-secret", 600);
        let subject = UserId::random();
        let now = Utc::now();

        assert_ne!(
            signer.sign(&subject, now).unwrap(),
            signer.sign(&subject, now).unwrap()
        );
    }

    #[test]
    fn garbage_is_invalid() {
        let signer = TokenSigner::new(TokenKind::Access, "access-secret", 60);
        assert_eq!(signer.verify("a.b.c"), TokenVerdict::Invalid);
    }
}
