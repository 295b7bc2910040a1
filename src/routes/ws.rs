//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::do_chat_reply;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "herdcheck", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "herdcheck", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "herdcheck", kind = incoming.kind(), "WS received");
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "herdcheck", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "herdcheck", "WebSocket disconnected");
}

#[instrument(level = "info", skip_all, fields(kind = msg.kind()))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Chat { message, score, total_questions } => {
      match do_chat_reply(state, &message, score, total_questions).await {
        Ok(reply) => ServerWsMessage::ChatReply { reply },
        Err(e) => {
          error!(target: "herdcheck", error = %e, "WS chat failed");
          ServerWsMessage::Error { message: e.to_string() }
        }
      }
    }

    ClientWsMessage::Situation => match state.situations.pick().await {
      Some(text) => ServerWsMessage::Situation { text },
      None => ServerWsMessage::Error { message: "No situations configured.".into() },
    },

    ClientWsMessage::HeartRate => {
      let sample = state.heart.tick().await;
      ServerWsMessage::HeartRate { sample, recent: state.heart.recent().await }
    }
  }
}
