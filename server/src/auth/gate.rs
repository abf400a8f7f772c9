//! Authentication gate shared by the HTTP middleware and the WebSocket handshake.
//!
//! Resolution order: access cookie, then refresh cookie (which silently
//! re-issues both cookies), otherwise reject. A token alone is never trusted
//! for the role: the user is re-read on every resolution.

use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::debug;

use super::errors::{AuthError, RejectReason};
use super::jwt::TokenVerdict;
use super::session::SessionIssuer;
use crate::models::{Identity, UserId, UserRole};
use crate::services::UserStore;

pub struct Authenticator {
    sessions: Arc<SessionIssuer>,
    users: Arc<dyn UserStore>,
}

impl Authenticator {
    pub fn new(sessions: Arc<SessionIssuer>, users: Arc<dyn UserStore>) -> Self {
        Self { sessions, users }
    }

    pub fn sessions(&self) -> &Arc<SessionIssuer> {
        &self.sessions
    }

    /// Resolve the caller behind `incoming`.
    ///
    /// When the refresh path is taken, the fresh cookie pair is added to
    /// `outgoing`; otherwise `outgoing` is left as it was.
    pub async fn authenticate(
        &self,
        incoming: &CookieJar,
        outgoing: &mut CookieJar,
    ) -> Result<Identity, AuthError> {
        let tokens = self.sessions.tokens();
        let cookies = self.sessions.cookies();
        let mut reason = RejectReason::MissingCredentials;

        if let Some(access) = credential(incoming, cookies.access_name()) {
            match tokens.verify_access(&access) {
                TokenVerdict::Valid(subject) => return self.lookup(&subject).await,
                verdict => {
                    debug!(?verdict, "access credential rejected, falling back to refresh");
                    reason = verdict.rejection().unwrap_or(RejectReason::Invalid);
                }
            }
        }

        let Some(refresh) = credential(incoming, cookies.refresh_name()) else {
            debug!(?reason, "no usable credentials");
            return Err(AuthError::LoginRequired(reason));
        };

        let subject = match tokens.verify_refresh(&refresh).await? {
            TokenVerdict::Valid(subject) => subject,
            verdict => {
                debug!(?verdict, "refresh credential rejected");
                return Err(AuthError::LoginRequired(
                    verdict.rejection().unwrap_or(RejectReason::Invalid),
                ));
            }
        };

        let identity = self.lookup(&subject).await?;
        if !self.sessions.establish_session(outgoing, &subject).await {
            return Err(AuthError::SessionUnavailable);
        }

        debug!(user_id = %subject, "session silently refreshed");
        Ok(identity)
    }

    async fn lookup(&self, subject: &UserId) -> Result<Identity, AuthError> {
        match self.users.find_identity(subject).await? {
            Some(identity) => Ok(identity),
            None => {
                debug!(user_id = %subject, "token subject no longer exists");
                Err(AuthError::LoginRequired(RejectReason::UnknownSubject))
            }
        }
    }
}

/// Role check run after a successful [`Authenticator::authenticate`].
pub fn authorize_role(identity: &Identity, role: UserRole) -> Result<(), AuthError> {
    if identity.role == role {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

fn credential(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
