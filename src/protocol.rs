//! Public HTTP request/response structs (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::QuizQuestion;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadOut {
    pub text: String,
}

/// Body of `POST /api/generate_questions`. A missing or null `text` reads as empty
/// and is rejected by the pipeline as "no text provided".
#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionsOut {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
