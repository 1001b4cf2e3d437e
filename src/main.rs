//! PDF Quiz Backend
//!
//! - Axum HTTP API: PDF upload -> text, text -> multiple-choice quiz
//! - Quiz generation via an OpenAI-compatible chat.completions endpoint
//!
//! Important env variables:
//!   PORT                        : u16 (default 5000)
//!   OPENAI_API_KEY              : required; startup fails without it
//!   OPENAI_BASE_URL             : default "https://api.openai.com/v1"
//!   OPENAI_MODEL                : default "gpt-4"
//!   OPENAI_TEMPERATURE          : default 0.7
//!   OPENAI_TIMEOUT_SECS         : upstream request timeout (default 30)
//!   MAX_CONCURRENT_GENERATIONS  : simultaneous upstream calls (default 8)
//!   MAX_UPLOAD_BYTES            : request body cap (default 20 MiB)
//!   QUIZ_CONFIG_PATH            : path to TOML config (prompt overrides)
//!   LOG_LEVEL                   : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                  : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod prompt;
mod extract;
mod openai;
mod quiz;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Resolve configuration once; a missing API key stops the process here.
  let cfg = AppConfig::from_env().map_err(|e| {
    error!(target: "pdf_quiz_backend", error = %e, "Invalid configuration");
    e
  })?;

  let state = Arc::new(AppState::new(&cfg)?);
  let app = build_router(state, cfg.max_upload_bytes);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "pdf_quiz_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "pdf_quiz_backend", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "pdf_quiz_backend", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "pdf_quiz_backend", "Shutdown signal received");
}
