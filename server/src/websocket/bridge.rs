//! Handshake-time authentication for WebSocket clients.

use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::directory::{ConnectionDirectory, ConnectionHandle, ConnectionId, PushEvent};
use crate::auth::{AuthError, Authenticator};
use crate::models::{Identity, UserId};

/// An authenticated connection that has been registered in the directory.
#[derive(Debug)]
pub struct LiveConnection {
    pub identity: Identity,
    pub connection_id: ConnectionId,
    pub inbox: mpsc::Receiver<PushEvent>,
}

pub struct RealtimeBridge {
    authenticator: Arc<Authenticator>,
    directory: ConnectionDirectory,
}

impl RealtimeBridge {
    pub fn new(authenticator: Arc<Authenticator>, directory: ConnectionDirectory) -> Self {
        Self {
            authenticator,
            directory,
        }
    }

    pub fn directory(&self) -> &ConnectionDirectory {
        &self.directory
    }

    /// Authenticate the upgrade request and register the connection.
    ///
    /// Uses the same access → refresh → reject resolution as the HTTP gate.
    /// Refreshed cookies land in `outgoing` and must go out on the upgrade
    /// response. On error nothing is registered.
    pub async fn handshake(
        &self,
        incoming: &CookieJar,
        outgoing: &mut CookieJar,
    ) -> Result<LiveConnection, AuthError> {
        let identity = self.authenticator.authenticate(incoming, outgoing).await?;

        let (handle, inbox) = ConnectionHandle::open();
        let connection_id = handle.connection_id;
        if let Some(previous) = self.directory.set(identity.id, handle).await {
            debug!(
                user_id = %identity.id,
                previous = %previous.connection_id,
                "replacing live connection"
            );
        }

        info!(user_id = %identity.id, %connection_id, "client connected");
        Ok(LiveConnection {
            identity,
            connection_id,
            inbox,
        })
    }

    pub async fn disconnect(&self, subject: &UserId, connection_id: ConnectionId) {
        if self.directory.remove_if(subject, connection_id).await {
            info!(user_id = %subject, %connection_id, "client disconnected");
        }
    }
}
