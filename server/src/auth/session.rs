//! Session issuance: mint a token pair and attach it to the response as cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::error;

use super::errors::StoreError;
use super::service::TokenService;
use crate::config::AuthConfig;
use crate::models::UserId;

/// Names and attributes of the two credential cookies.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    access_name: String,
    refresh_name: String,
    access_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
    production: bool,
}

impl CookieSettings {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            access_name: config.access.cookie_name.clone(),
            refresh_name: config.refresh.cookie_name.clone(),
            access_ttl_seconds: config.access.ttl_seconds,
            refresh_ttl_seconds: config.refresh.ttl_seconds,
            production: config.environment.is_production(),
        }
    }

    pub fn access_name(&self) -> &str {
        &self.access_name
    }

    pub fn refresh_name(&self) -> &str {
        &self.refresh_name
    }

    fn credential(&self, name: &str, value: String, ttl_seconds: u64) -> Cookie<'static> {
        let max_age = time::Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX));
        Cookie::build((name.to_string(), value))
            .http_only(true)
            .secure(self.production)
            .same_site(if self.production {
                SameSite::None
            } else {
                SameSite::Lax
            })
            .path("/")
            .max_age(max_age)
            .build()
    }

    fn cleared(&self, name: &str) -> Cookie<'static> {
        self.credential(name, String::new(), 0)
    }
}

pub struct SessionIssuer {
    tokens: Arc<TokenService>,
    cookies: CookieSettings,
}

impl SessionIssuer {
    pub fn new(tokens: Arc<TokenService>, cookies: CookieSettings) -> Self {
        Self { tokens, cookies }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub fn cookies(&self) -> &CookieSettings {
        &self.cookies
    }

    /// Issue a fresh access/refresh pair for `subject` and add both cookies to `jar`.
    ///
    /// Returns `false` if either token could not be issued; `jar` is left
    /// untouched in that case.
    pub async fn establish_session(&self, jar: &mut CookieJar, subject: &UserId) -> bool {
        let (access, refresh) = tokio::join!(
            self.tokens.issue_access(subject),
            self.tokens.issue_refresh(subject)
        );

        let (access, refresh) = match (access, refresh) {
            (Ok(access), Ok(refresh)) => (access, refresh),
            (access, refresh) => {
                if let Err(err) = access {
                    error!(user_id = %subject, error = %err, "cannot issue access token");
                }
                if let Err(err) = refresh {
                    error!(user_id = %subject, error = %err, "cannot issue refresh token");
                }
                return false;
            }
        };

        let current = std::mem::replace(jar, CookieJar::new());
        *jar = current
            .add(self.cookies.credential(
                &self.cookies.access_name,
                access,
                self.cookies.access_ttl_seconds,
            ))
            .add(self.cookies.credential(
                &self.cookies.refresh_name,
                refresh,
                self.cookies.refresh_ttl_seconds,
            ));
        true
    }

    /// Overwrite both cookies with expired blanks and revoke the subject's
    /// refresh ledger entry.
    ///
    /// Cookies are cleared even when revocation fails.
    pub async fn terminate_session(
        &self,
        jar: &mut CookieJar,
        subject: &UserId,
    ) -> Result<(), StoreError> {
        let current = std::mem::replace(jar, CookieJar::new());
        *jar = current
            .add(self.cookies.cleared(&self.cookies.access_name))
            .add(self.cookies.cleared(&self.cookies.refresh_name));

        self.tokens.revoke_refresh(subject).await.map(|_| ())
    }
}
