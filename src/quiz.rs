//! Quiz generation pipeline: text in, questions out.
//!
//! One upstream call per request, never retried: re-asking the model yields a
//! different quiz, so retrying is left to the caller. The reply is checked in
//! order, each step with its own failure:
//!   1. transport / status failure    -> `UpstreamUnreachable`
//!   2. no choices                     -> `EmptyUpstreamResponse`
//!   3. missing or blank content       -> handed to step 4 as an empty string
//!   4. content is not a question array -> `InvalidUpstreamFormat`
//!
//! Decoded questions are returned untouched. A question with three options, or a
//! `correctAnswer` that is not one of its options, passes through as-is.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use crate::config::{Prompts, UpstreamConfig};
use crate::domain::QuizQuestion;
use crate::error::GenerationFailure;
use crate::openai::{ChatCompletion, ChatCompletionRequest, ChatMessageReq};
use crate::prompt::build_prompt;
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct QuizGenerator {
  client: Arc<dyn ChatCompletion>,
  model: String,
  temperature: f32,
  prompts: Prompts,
  permits: Arc<Semaphore>,
}

impl QuizGenerator {
  pub fn new(client: Arc<dyn ChatCompletion>, cfg: &UpstreamConfig, prompts: Prompts) -> Self {
    Self {
      client,
      model: cfg.model.clone(),
      temperature: cfg.temperature,
      prompts,
      permits: Arc::new(Semaphore::new(cfg.max_concurrent.max(1))),
    }
  }

  /// Exactly one system message followed by one user message.
  pub fn build_request(&self, text: &str) -> ChatCompletionRequest {
    let prompt = build_prompt(&self.prompts, text);
    ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq::system(prompt.system), ChatMessageReq::user(prompt.user)],
      temperature: self.temperature,
    }
  }

  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), model = %self.model))]
  pub async fn generate_quiz(&self, text: &str) -> Result<Vec<QuizQuestion>, GenerationFailure> {
    if text.is_empty() {
      return Err(GenerationFailure::NoTextProvided);
    }

    let req = self.build_request(text);

    let response = {
      // Closed only if the semaphore is dropped, which cannot happen while `self` holds it.
      let _permit = self.permits.acquire().await
        .map_err(|e| GenerationFailure::UpstreamUnreachable(e.to_string()))?;
      let start = std::time::Instant::now();
      let result = self.client.complete(&req).await;
      let elapsed = start.elapsed();
      match result {
        Ok(r) => r,
        Err(e) => {
          error!(target: "quiz", ?elapsed, error = %e, "Upstream call failed");
          return Err(GenerationFailure::UpstreamUnreachable(e.to_string()));
        }
      }
    };

    if response.choices.is_empty() {
      warn!(target: "quiz", "Upstream returned no choices");
      return Err(GenerationFailure::EmptyUpstreamResponse);
    }

    let content = response.first_content().unwrap_or_default().trim();

    match serde_json::from_str::<Vec<QuizQuestion>>(content) {
      Ok(questions) => {
        info!(target: "quiz", count = questions.len(), "Quiz generated");
        Ok(questions)
      }
      Err(e) => {
        error!(target: "quiz", error = %e, raw = %trunc_for_log(content, 500), "Upstream content is not a question array");
        Err(GenerationFailure::InvalidUpstreamFormat { detail: e.to_string(), raw: content.to_string() })
      }
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;
  use std::time::Duration;

  use async_trait::async_trait;

  use crate::openai::{ChatCompletionResponse, ChatError, OpenAI};

  /// Canned upstream that records every request it sees.
  pub(crate) struct StubUpstream {
    reply: Box<dyn Fn() -> Result<ChatCompletionResponse, ChatError> + Send + Sync>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<ChatCompletionRequest>>,
  }

  impl StubUpstream {
    pub(crate) fn replying(
      reply: impl Fn() -> Result<ChatCompletionResponse, ChatError> + Send + Sync + 'static,
    ) -> Arc<Self> {
      Arc::new(Self { reply: Box::new(reply), calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) })
    }

    pub(crate) fn content(content: &'static str) -> Arc<Self> {
      Self::replying(move || Ok(ChatCompletionResponse::with_content(content)))
    }
  }

  #[async_trait]
  impl ChatCompletion for StubUpstream {
    async fn complete(&self, req: &ChatCompletionRequest) -> Result<ChatCompletionResponse, ChatError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.seen.lock().expect("lock").push(req.clone());
      (self.reply)()
    }
  }

  pub(crate) fn upstream_cfg() -> UpstreamConfig {
    UpstreamConfig {
      api_key: "sk-test".into(),
      base_url: "http://127.0.0.1:1/v1".into(),
      model: "gpt-4".into(),
      temperature: 0.7,
      timeout: Duration::from_secs(2),
      max_concurrent: 4,
    }
  }

  pub(crate) const THREE_QUESTIONS: &str = r#"[
    {"question": "What does photosynthesis convert light into?", "options": ["Heat", "Chemical energy", "Sound", "Motion"], "correctAnswer": "Chemical energy"},
    {"question": "Which organisms photosynthesize?", "options": ["Plants", "Rocks", "Metals", "Clouds"], "correctAnswer": "Plants"},
    {"question": "What is the input energy?", "options": ["Light", "Wind", "Tides", "Magnetism"], "correctAnswer": "Light"}
  ]"#;

  fn generator(stub: Arc<StubUpstream>) -> QuizGenerator {
    QuizGenerator::new(stub, &upstream_cfg(), Prompts::default())
  }

  #[tokio::test]
  async fn empty_text_short_circuits_without_network() {
    let stub = StubUpstream::content(THREE_QUESTIONS);
    let err = generator(stub.clone()).generate_quiz("").await.unwrap_err();
    assert!(matches!(err, GenerationFailure::NoTextProvided));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn well_formed_reply_is_returned_unchanged() {
    let stub = StubUpstream::content(THREE_QUESTIONS);
    let questions = generator(stub.clone()).generate_quiz("Photosynthesis converts light into chemical energy.").await.expect("quiz");
    let expected: Vec<QuizQuestion> = serde_json::from_str(THREE_QUESTIONS).expect("fixture");
    assert_eq!(questions, expected);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn request_has_one_system_then_one_user_message() {
    let stub = StubUpstream::content(THREE_QUESTIONS);
    generator(stub.clone()).generate_quiz("Cells divide by mitosis.").await.expect("quiz");

    let seen = stub.seen.lock().expect("lock");
    let req = &seen[0];
    assert_eq!(req.model, "gpt-4");
    assert_eq!(req.temperature, 0.7);
    let roles: Vec<&str> = req.messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, ["system", "user"]);
    assert!(req.messages[1].content.contains("Cells divide by mitosis."));
  }

  #[tokio::test]
  async fn malformed_questions_pass_through() {
    let stub = StubUpstream::content(
      r#"[{"question": "Q1", "options": ["A", "B", "C"], "correctAnswer": "Z"},
          {"question": "Q2", "options": ["A", "B", "C", "D"], "correctAnswer": "B"},
          {"question": "Q3", "options": ["A", "B", "C", "D", "E"], "correctAnswer": "E"}]"#,
    );
    let questions = generator(stub).generate_quiz("text").await.expect("quiz");
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].options.len(), 3);
    assert_eq!(questions[0].correct_answer, "Z");
    assert_eq!(questions[2].options.len(), 5);
  }

  #[tokio::test]
  async fn surrounding_whitespace_is_trimmed_before_decoding() {
    let stub = StubUpstream::content("\n\n  [{\"question\":\"Q\",\"options\":[\"a\",\"b\",\"c\",\"d\"],\"correctAnswer\":\"a\"}]  \n");
    let questions = generator(stub).generate_quiz("text").await.expect("quiz");
    assert_eq!(questions.len(), 1);
  }

  #[tokio::test]
  async fn no_choices_is_empty_upstream_response() {
    let stub = StubUpstream::replying(|| Ok(ChatCompletionResponse::default()));
    let err = generator(stub).generate_quiz("text").await.unwrap_err();
    assert!(matches!(err, GenerationFailure::EmptyUpstreamResponse));
  }

  #[tokio::test]
  async fn non_json_content_is_invalid_format() {
    let stub = StubUpstream::content("sorry, I can't help with that");
    let err = generator(stub).generate_quiz("text").await.unwrap_err();
    match err {
      GenerationFailure::InvalidUpstreamFormat { raw, .. } => assert_eq!(raw, "sorry, I can't help with that"),
      other => panic!("unexpected: {other:?}"),
    }
  }

  #[tokio::test]
  async fn wrong_json_shape_is_invalid_format() {
    for content in [r#"{"questions": []}"#, r#"[{"question": "Q"}]"#, "```json\n[]\n```"] {
      let err = generator(StubUpstream::content(content)).generate_quiz("text").await.unwrap_err();
      assert!(matches!(err, GenerationFailure::InvalidUpstreamFormat { .. }), "content={content}");
    }
  }

  #[tokio::test]
  async fn missing_or_blank_content_is_invalid_format() {
    let null_content = StubUpstream::replying(|| {
      Ok(serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).expect("json"))
    });
    let err = generator(null_content).generate_quiz("text").await.unwrap_err();
    assert!(matches!(err, GenerationFailure::InvalidUpstreamFormat { .. }));

    let err = generator(StubUpstream::content("   \n")).generate_quiz("text").await.unwrap_err();
    assert!(matches!(err, GenerationFailure::InvalidUpstreamFormat { .. }));
  }

  #[tokio::test]
  async fn upstream_status_error_is_unreachable() {
    let stub = StubUpstream::replying(|| {
      Err(ChatError::Status { status: 401, message: "Incorrect API key provided".into() })
    });
    let err = generator(stub.clone()).generate_quiz("text").await.unwrap_err();
    assert!(matches!(err, GenerationFailure::UpstreamUnreachable(ref d) if d.contains("401")));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn connection_refused_is_unreachable_not_invalid_format() {
    let cfg = upstream_cfg();
    let client = OpenAI::new(&cfg).expect("client");
    let gen = QuizGenerator::new(Arc::new(client), &cfg, Prompts::default());
    let err = gen.generate_quiz("text").await.unwrap_err();
    assert!(matches!(err, GenerationFailure::UpstreamUnreachable(_)));
  }

  #[tokio::test]
  async fn concurrent_calls_are_capped() {
    struct Slow { active: AtomicUsize, peak: AtomicUsize }

    #[async_trait]
    impl ChatCompletion for Slow {
      async fn complete(&self, _req: &ChatCompletionRequest) -> Result<ChatCompletionResponse, ChatError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(ChatCompletionResponse::with_content(THREE_QUESTIONS))
      }
    }

    let slow = Arc::new(Slow { active: AtomicUsize::new(0), peak: AtomicUsize::new(0) });
    let mut cfg = upstream_cfg();
    cfg.max_concurrent = 2;
    let gen = QuizGenerator::new(slow.clone(), &cfg, Prompts::default());

    let mut handles = Vec::new();
    for _ in 0..6 {
      let gen = gen.clone();
      handles.push(tokio::spawn(async move { gen.generate_quiz("text").await }));
    }
    for h in handles {
      h.await.expect("join").expect("quiz");
    }
    assert!(slow.peak.load(Ordering::SeqCst) <= 2);
  }
}
