//! Live connection directory: which socket currently represents each user.
//!
//! Process-local and rebuilt from nothing on restart. One entry per user; a
//! reconnect overwrites the previous entry (last writer wins).

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::warn;
use uuid::Uuid;

use crate::models::UserId;

pub type ConnectionId = Uuid;

/// Pushes queued per connection before further events are dropped.
pub const OUTBOX_CAPACITY: usize = 64;

/// Application events pushed to connected clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SocketEvent {
    #[serde(rename = "SEND_NOTIFICATION")]
    SendNotification,
}

/// Frame delivered to a client, serialized as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct PushEvent {
    pub event: SocketEvent,
    pub data: serde_json::Value,
}

impl PushEvent {
    pub fn notification(data: serde_json::Value) -> Self {
        Self {
            event: SocketEvent::SendNotification,
            data,
        }
    }
}

/// Sending half of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: ConnectionId,
    outbox: mpsc::Sender<PushEvent>,
}

impl ConnectionHandle {
    /// New handle plus the receiver the socket task drains.
    pub fn open() -> (Self, mpsc::Receiver<PushEvent>) {
        let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
        (
            Self {
                connection_id: Uuid::new_v4(),
                outbox,
            },
            inbox,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionDirectory {
    connections: Arc<RwLock<HashMap<UserId, ConnectionHandle>>>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `subject` to `handle`, returning the handle it replaced.
    pub async fn set(&self, subject: UserId, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        self.connections.write().await.insert(subject, handle)
    }

    pub async fn get(&self, subject: &UserId) -> Option<ConnectionId> {
        self.connections
            .read()
            .await
            .get(subject)
            .map(|handle| handle.connection_id)
    }

    /// Remove the entry only if it still belongs to `connection_id`.
    pub async fn remove_if(&self, subject: &UserId, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(subject) {
            Some(handle) if handle.connection_id == connection_id => {
                connections.remove(subject);
                true
            }
            _ => false,
        }
    }

    /// Push `event` to the connection currently registered for `subject`.
    /// Returns `false` when the user has no live connection or its outbox is full.
    pub async fn emit(&self, subject: &UserId, event: PushEvent) -> bool {
        let connections = self.connections.read().await;
        let Some(handle) = connections.get(subject) else {
            return false;
        };
        match handle.outbox.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    user_id = %subject,
                    connection_id = %handle.connection_id,
                    "outbox full, push dropped"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
