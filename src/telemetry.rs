//! Tracing setup for the quiz backend.
//!
//! Log targets emitted by this crate:
//! - `extract`           : upload received, PDF parse outcome, empty-text detection
//! - `quiz`              : upstream call failures, reply validation, question counts
//! - `pdf_quiz_backend`  : startup, config loading, shutdown
//!
//! `tower_http` adds one span per HTTP request (method, path, status, latency).
//!
//! LOG_LEVEL replaces the default filter entirely (e.g. "debug" or
//! "info,quiz=trace"). LOG_FORMAT=json switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str =
    "info,quiz=debug,extract=debug,pdf_quiz_backend=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than "json" (case-insensitive) falls back to pretty output.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok();
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_from(level.as_deref()))
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
