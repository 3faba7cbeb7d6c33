//! Chat restriction endpoints.
//!
//! `GET /chat/restrictions/ws` pushes the caller's restriction as JSON text
//! frames: once on connect, then after every re-evaluation. The watcher is
//! dropped with the socket, which releases its change-feed subscriptions.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use crate::application::handlers::chat::RestrictionWatcher;
use crate::domain::chat::ChatRestriction;
use crate::domain::foundation::UserId;

use super::middleware::RequireAuth;
use super::state::AppState;

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/restrictions", get(current_restriction))
        .route("/chat/restrictions/ws", get(restriction_stream))
}

/// Never fails: lookup errors resolve to a blocked result.
async fn current_restriction(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Json<ChatRestriction> {
    Json(state.chat_restrictions.check(&user.id).await)
}

async fn restriction_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let watcher = state.restriction_watchers.watch(user.id).await;
        stream_restrictions(socket, user.id, watcher).await;
    })
}

async fn stream_restrictions(mut socket: WebSocket, user_id: UserId, watcher: RestrictionWatcher) {
    tracing::debug!(user_id = %user_id, "Chat restriction stream opened");

    let mut updates = watcher.updates();
    let initial = updates.borrow_and_update().clone();
    if send_restriction(&mut socket, &initial).await.is_err() {
        watcher.close().await;
        return;
    }

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = updates.borrow_and_update().clone();
                if send_restriction(&mut socket, &current).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(user_id = %user_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    watcher.close().await;
    tracing::debug!(user_id = %user_id, "Chat restriction stream closed");
}

async fn send_restriction(socket: &mut WebSocket, restriction: &ChatRestriction) -> Result<(), ()> {
    let text = serde_json::to_string(restriction).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize chat restriction");
    })?;
    socket.send(Message::Text(text)).await.map_err(|_| ())
}
