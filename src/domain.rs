//! Domain models: the uploaded document, its extracted text, the quiz prompt and quiz questions.

use serde::{Deserialize, Serialize};

/// Raw upload as received from the multipart form. Lives for one request only.
#[derive(Clone, Debug)]
pub struct UploadedDocument {
  pub filename: String,
  pub bytes: Vec<u8>,
}

impl UploadedDocument {
  pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self { filename: filename.into(), bytes }
  }
}

/// Text pulled out of a document. Never empty once constructed by the extraction pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedText {
  pub text: String,
  /// Length in characters, not bytes.
  pub len: usize,
}

impl ExtractedText {
  pub fn new(text: String) -> Self {
    let len = text.chars().count();
    Self { text, len }
  }
}

/// System + user instruction pair sent to the generation service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizPrompt {
  pub system: String,
  pub user: String,
}

/// One multiple-choice question as returned by the model.
///
/// Only the JSON shape is enforced. Option count and whether `correct_answer`
/// names one of the options are not checked.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
}
