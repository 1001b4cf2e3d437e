//! Application state shared by the handlers: the text extractor and the quiz generator.
//!
//! Both are immutable after startup; nothing here is written per request.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::extract::{PdfTextExtractor, TextExtractor};
use crate::openai::{ChatCompletion, OpenAI};
use crate::quiz::QuizGenerator;

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn TextExtractor>,
    pub generator: QuizGenerator,
}

impl AppState {
    /// Build production state: pdf-extract + the OpenAI client described by `cfg`.
    #[instrument(level = "info", skip_all)]
    pub fn new(cfg: &AppConfig) -> Result<Self, reqwest::Error> {
        let openai = OpenAI::new(&cfg.upstream)?;
        info!(
            target: "pdf_quiz_backend",
            base_url = %openai.base_url,
            model = %cfg.upstream.model,
            timeout = ?cfg.upstream.timeout,
            max_concurrent = cfg.upstream.max_concurrent,
            "OpenAI client ready."
        );
        Ok(Self::with_parts(Arc::new(PdfTextExtractor), Arc::new(openai), cfg))
    }

    /// Assemble state from explicit collaborators.
    pub fn with_parts(
        extractor: Arc<dyn TextExtractor>,
        upstream: Arc<dyn ChatCompletion>,
        cfg: &AppConfig,
    ) -> Self {
        Self {
            extractor,
            generator: QuizGenerator::new(upstream, &cfg.upstream, cfg.prompts.clone()),
        }
    }
}
