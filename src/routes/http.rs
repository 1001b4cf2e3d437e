//! HTTP endpoint handlers. These are thin wrappers that forward to the pipelines.
//! Each handler is instrumented and logs a request id plus basic result info.

use std::sync::Arc;

use axum::{
  extract::{
    multipart::{Multipart, MultipartError, MultipartRejection},
    rejection::JsonRejection,
    State,
  },
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::UploadedDocument;
use crate::error::ApiError;
use crate::extract::extract_text;
use crate::protocol::*;
use crate::state::AppState;

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "pdf";

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn http_upload(
  State(state): State<Arc<AppState>>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadOut>, ApiError> {
  let mut multipart = multipart.map_err(|e| {
    warn!(target: "extract", error = %e, "Upload is not a multipart form");
    ApiError::NoFileProvided
  })?;

  let doc = read_upload(&mut multipart).await?.ok_or_else(|| {
    warn!(target: "extract", field = UPLOAD_FIELD, "No file in upload");
    ApiError::NoFileProvided
  })?;

  let extracted = extract_text(state.extractor.clone(), doc).await?;
  info!(target: "extract", chars = extracted.len, "HTTP upload extracted");
  Ok(Json(UploadOut { text: extracted.text }))
}

#[instrument(level = "info", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn http_generate_questions(
  State(state): State<Arc<AppState>>,
  body: Result<Json<GenerateIn>, JsonRejection>,
) -> Result<Json<QuestionsOut>, ApiError> {
  let Json(body) = body.map_err(|e| {
    warn!(target: "quiz", error = %e, "Rejected generate_questions body");
    ApiError::InvalidRequestBody(e.body_text())
  })?;

  let text = body.text.unwrap_or_default();
  let questions = state.generator.generate_quiz(&text).await?;
  info!(target: "quiz", count = questions.len(), text_len = text.len(), "HTTP questions generated");
  Ok(Json(QuestionsOut { questions }))
}

/// First `pdf` field of the form, buffered in memory. Other fields are skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<UploadedDocument>, ApiError> {
  while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
    if field.name() != Some(UPLOAD_FIELD) {
      continue;
    }
    let filename = field.file_name().unwrap_or("upload.pdf").to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;
    info!(target: "extract", %filename, size = bytes.len(), "Upload received");
    return Ok(Some(UploadedDocument::new(filename, bytes.to_vec())));
  }
  Ok(None)
}

fn multipart_error(e: MultipartError) -> ApiError {
  warn!(target: "extract", error = %e, "Malformed multipart upload");
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ApiError::UploadTooLarge
  } else {
    ApiError::InvalidRequestBody(e.body_text())
  }
}
