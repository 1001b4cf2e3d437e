use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::protocol::ErrorOut;

#[derive(Error, Debug)]
pub enum ExtractionFailure {
    #[error("PDF parse error: {0}")]
    ParseError(String),

    #[error("document produced no extractable text")]
    EmptyResult,
}

#[derive(Error, Debug)]
pub enum GenerationFailure {
    #[error("no text provided")]
    NoTextProvided,

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream returned no choices")]
    EmptyUpstreamResponse,

    #[error("upstream content is not a question array: {detail}")]
    InvalidUpstreamFormat { detail: String, raw: String },
}

/// Everything a handler can fail with, mapped onto a status code and a fixed client message.
/// Upstream details stay in the logs; the client only sees the message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("no file uploaded")]
    NoFileProvided,

    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    #[error("upload exceeds the configured size limit")]
    UploadTooLarge,

    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),

    #[error(transparent)]
    Generation(#[from] GenerationFailure),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFileProvided
            | ApiError::InvalidRequestBody(_)
            | ApiError::Generation(GenerationFailure::NoTextProvided) => StatusCode::BAD_REQUEST,
            ApiError::UploadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Extraction(_) | ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_message(&self) -> &'static str {
        match self {
            ApiError::NoFileProvided => "No file uploaded",
            ApiError::InvalidRequestBody(_) => "Invalid request body",
            ApiError::UploadTooLarge => "File too large",
            ApiError::Extraction(ExtractionFailure::ParseError(_)) => "Failed to process the PDF",
            ApiError::Extraction(ExtractionFailure::EmptyResult) => {
                "No extractable text found in the PDF"
            }
            ApiError::Generation(GenerationFailure::NoTextProvided) => "No text provided",
            ApiError::Generation(GenerationFailure::UpstreamUnreachable(_)) => {
                "Failed to generate questions"
            }
            ApiError::Generation(GenerationFailure::EmptyUpstreamResponse) => {
                "AI service returned an empty response"
            }
            ApiError::Generation(GenerationFailure::InvalidUpstreamFormat { .. }) => {
                "AI service returned questions in an unexpected format"
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorOut {
            error: self.client_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
