//! Extraction pipeline: uploaded PDF bytes in, usable text out.
//!
//! Parsing is delegated to `pdf-extract` behind the `TextExtractor` trait. It is
//! CPU-bound, so it runs on the blocking pool. A failed parse is not retried.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::domain::{ExtractedText, UploadedDocument};
use crate::error::ExtractionFailure;

pub type ExtractorError = Box<dyn std::error::Error + Send + Sync>;

/// Bytes in, text out. Implementations are opaque: any error is a parse failure.
pub trait TextExtractor: Send + Sync {
  fn extract(&self, bytes: &[u8]) -> Result<String, ExtractorError>;
}

/// Production extractor backed by `pdf_extract::extract_text_from_mem`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
  fn extract(&self, bytes: &[u8]) -> Result<String, ExtractorError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string().into())
  }
}

/// Run the extractor over one upload.
///
/// - zero-byte upload: `EmptyResult`, the extractor is not called
/// - extractor error or panic: `ParseError`
/// - whitespace-only text: `EmptyResult`
#[instrument(level = "info", skip(extractor, doc), fields(filename = %doc.filename, size = doc.bytes.len()))]
pub async fn extract_text(
  extractor: Arc<dyn TextExtractor>,
  doc: UploadedDocument,
) -> Result<ExtractedText, ExtractionFailure> {
  if doc.bytes.is_empty() {
    warn!(target: "extract", filename = %doc.filename, "Empty upload; nothing to extract");
    return Err(ExtractionFailure::EmptyResult);
  }

  let UploadedDocument { filename, bytes } = doc;
  let start = std::time::Instant::now();
  // pdf-extract can panic on malformed input; the JoinError catches it.
  let joined = tokio::task::spawn_blocking(move || extractor.extract(&bytes)).await;
  let elapsed = start.elapsed();

  let text = match joined {
    Ok(Ok(text)) => text,
    Ok(Err(e)) => {
      error!(target: "extract", %filename, ?elapsed, error = %e, "PDF parsing failed");
      return Err(ExtractionFailure::ParseError(e.to_string()));
    }
    Err(e) => {
      error!(target: "extract", %filename, ?elapsed, error = %e, "PDF parser aborted");
      return Err(ExtractionFailure::ParseError(e.to_string()));
    }
  };

  if text.trim().is_empty() {
    warn!(target: "extract", %filename, ?elapsed, "PDF parsed but contains no text (scanned or image-only?)");
    return Err(ExtractionFailure::EmptyResult);
  }

  let out = ExtractedText::new(text);
  info!(target: "extract", %filename, ?elapsed, chars = out.len, "PDF text extracted");
  Ok(out)
}
