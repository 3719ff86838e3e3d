//! WebSocket endpoint for the event channel.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap},
    response::Response,
};

use super::ClientMessage;
use crate::AppState;

/// GET /api/events - Upgrade to the live event channel.
pub async fn events_ws(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown")
        .to_string();

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_agent))
}

/// Pump queued events out and relay spotlight intents in until either side closes.
async fn handle_socket(mut socket: WebSocket, state: AppState, user_agent: String) {
    let mut subscription = state.repo.subscribe(&user_agent).await;
    let id = subscription.id();

    loop {
        tokio::select! {
            frame = subscription.recv() => {
                let Some(frame) = frame else { break };
                if socket.send(Message::Text(frame.as_ref().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => handle_intent(&state, text.as_str()).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("Event channel {} read error: {}", id, e);
                        break;
                    }
                }
            }
        }
    }
}

async fn handle_intent(state: &AppState, text: &str) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Dropping malformed client message: {}", e);
            return;
        }
    };

    if let Err(e) = state.repo.relay(message).await {
        tracing::warn!("Dropping spotlight intent: {}", e);
    }
}
