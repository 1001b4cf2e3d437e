//! Prompt construction for quiz generation.
//!
//! The document text is cut to a fixed prefix before it is embedded. The cut is a
//! plain character count with no attempt at sentence boundaries.

use crate::config::Prompts;
use crate::domain::QuizPrompt;
use crate::util::{fill_template, take_chars};

/// Maximum number of characters of source text embedded in a prompt.
pub const SOURCE_CHAR_LIMIT: usize = 1000;

pub fn build_prompt(prompts: &Prompts, text: &str) -> QuizPrompt {
  let source = take_chars(text, SOURCE_CHAR_LIMIT);
  QuizPrompt {
    system: prompts.system.clone(),
    user: fill_template(&prompts.user_template, &[("text", source)]),
  }
}
