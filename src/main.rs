//! Herdcheck · peer-conformity self-assessment backend
//!
//! - Survey wizard sessions, scoring and risk classification
//! - Results, reviews board, situation exercise, simulated heart-rate readout
//! - Optional chat assistant backed by the generative-language API
//! - Axum HTTP + WebSocket API, static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                  : u16 (default 3000)
//!   GEMINI_API_KEY        : enables the chat assistant if present
//!   GEMINI_BASE_URL       : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL          : default "gemini-1.5-flash"
//!   HERDCHECK_CONFIG_PATH : path to TOML config (prompts, question catalog, situations)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default), "compact" or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod seeds;
mod scoring;
mod store;
mod session;
mod situations;
mod heart;
mod state;
mod protocol;
mod logic;
mod gemini;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: catalog, in-memory store, sessions, chat client.
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "herdcheck", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "herdcheck", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "herdcheck", "Shutdown signal received");
}
