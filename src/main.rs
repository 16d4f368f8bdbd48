//! QA hint service
//!
//! - Axum HTTP API under /api/qa
//! - Optional OpenAI-compatible model (via environment variables); fallbacks otherwise
//!
//! Important env variables:
//!   PORT                : u16 (default 5274)
//!   OPENAI_API_KEY      : enables the model client if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL   : hint model, default "gpt-4o-mini"
//!   OPENAI_STRONG_MODEL : solution/analysis model, default "gpt-4o"
//!   OPENAI_TIMEOUT_SECS : model request timeout, default 20
//!   QA_CONFIG_PATH      : path to TOML config (engine, extra keywords, questions)
//!   QUESTIONS_PATH      : path to a JSON question bank
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use qa_hint_engine::routes::build_router;
use qa_hint_engine::state::AppState;
use qa_hint_engine::telemetry;

const DEFAULT_PORT: u16 = 5274;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::new());
  let app = build_router(state);

  let port = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .unwrap_or(DEFAULT_PORT);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "qa", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "qa", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => info!(target: "qa", "Ctrl-C received, shutting down"),
    Err(e) => warn!(target: "qa", error = %e, "Failed to listen for Ctrl-C; shutting down"),
  }
}
