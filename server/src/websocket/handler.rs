use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, warn};

use super::bridge::{LiveConnection, RealtimeBridge};
use crate::error::ApiError;

/// `GET /ws`: authenticate from the upgrade request's cookies, then upgrade.
///
/// A failed authentication answers the upgrade request with an error status,
/// so the socket is never opened.
pub async fn ws_handler(
    State(bridge): State<Arc<RealtimeBridge>>,
    jar: CookieJar,
    ws: WebSocketUpgrade,
) -> Response {
    let mut refreshed = CookieJar::new();
    let connection = match bridge.handshake(&jar, &mut refreshed).await {
        Ok(connection) => connection,
        Err(err) => {
            warn!(error = %err, "websocket handshake rejected");
            return ApiError::from(err).into_response();
        }
    };

    let subject = connection.identity.id;
    let connection_id = connection.connection_id;
    let on_failure = bridge.clone();
    let upgrade = ws
        .on_failed_upgrade(move |err| {
            warn!(error = %err, "websocket upgrade failed");
            tokio::spawn(async move { on_failure.disconnect(&subject, connection_id).await });
        })
        .on_upgrade(move |socket| serve_socket(socket, connection, bridge));

    (refreshed, upgrade).into_response()
}

async fn serve_socket(socket: WebSocket, connection: LiveConnection, bridge: Arc<RealtimeBridge>) {
    let LiveConnection {
        identity,
        connection_id,
        mut inbox,
    } = connection;
    let (mut sender, mut receiver) = socket.split();

    let push = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(err) => {
                    error!(error = %err, "cannot serialize push event");
                    continue;
                }
            };
            if sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        if matches!(message, Message::Close(_)) {
            break;
        }
    }

    push.abort();
    bridge.disconnect(&identity.id, connection_id).await;
}
