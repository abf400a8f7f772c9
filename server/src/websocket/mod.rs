//! Realtime channel: authenticated WebSocket connections and per-user push.

mod bridge;
mod directory;
mod handler;

pub use bridge::{LiveConnection, RealtimeBridge};
pub use directory::{
    ConnectionDirectory, ConnectionHandle, ConnectionId, PushEvent, SocketEvent, OUTBOX_CAPACITY,
};
pub use handler::ws_handler;
