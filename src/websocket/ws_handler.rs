use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::db::UserRole;
use crate::error::AppResult;
use crate::middleware::auth::{require_role, CurrentUser};

/// Live notification feed for the back office. The subscription is taken
/// before the upgrade so nothing published during the handshake is lost.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    user: CurrentUser,
    State(state): State<Arc<Mutex<broadcast::Sender<String>>>>,
) -> AppResult<impl IntoResponse> {
    require_role(&user, &[UserRole::Admin, UserRole::Operations])?;
    let rx = state.lock().unwrap().subscribe();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, rx)))
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    let (mut sender, mut receiver) = socket.split();

    // The feed is one-way: inbound frames are drained (pings, client noise)
    // until the peer closes.
    let recv_task = tokio::spawn(async move { while let Some(Ok(_)) = receiver.next().await {} });

    let send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = recv_task => {},
        _ = send_task => {},
    }
}
