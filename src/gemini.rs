//! Minimal client for the generative-language `generateContent` endpoint.
//!
//! One call shape only: a single user turn in, the first candidate's text out.
//! Calls are instrumented with model name, latency and response sizes (never contents).
//!
//! NOTE: the API key travels as the `key` query parameter; it is never logged.

use std::time::{Duration, Instant};

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::error::ChatError;
use crate::util::fill_template;

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Gemini {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
  }

  /// Send one prompt and return the first candidate's text.
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  pub async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
    let req = GenerateRequest {
      contents: vec![Content { role: "user".into(), parts: vec![Part { text: prompt.to_string() }] }],
    };

    let start = Instant::now();
    let res = self
      .client
      .post(self.endpoint())
      .query(&[("key", self.api_key.as_str())])
      .header(USER_AGENT, "herdcheck-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&req)
      .send()
      .await?;

    let status = res.status();
    let raw = res.text().await?;
    info!(status = status.as_u16(), body_len = raw.len(), elapsed = ?start.elapsed(), "Upstream responded");

    if !status.is_success() {
      let message = extract_error(&raw).unwrap_or_else(|| crate::util::trunc_for_log(&raw, 200));
      error!(status = status.as_u16(), %message, "Upstream returned an error");
      return Err(ChatError::Upstream { status: status.as_u16(), message });
    }

    extract_reply(&raw).ok_or(ChatError::NoReply)
  }

  /// Answer a respondent's question, optionally with their survey score as context.
  #[instrument(level = "info", skip(self, prompts, question), fields(question_len = question.len(), has_score = score_line.is_some()))]
  pub async fn assistant_reply(
    &self,
    prompts: &Prompts,
    question: &str,
    score_line: Option<&str>,
  ) -> Result<String, ChatError> {
    let prompt = build_prompt(prompts, question, score_line);
    self.generate(&prompt).await
  }
}

/// System prompt followed by the filled user template.
pub fn build_prompt(prompts: &Prompts, question: &str, score_line: Option<&str>) -> String {
  let score_line = score_line.map(|s| format!("{s}\n\n")).unwrap_or_default();
  let user = fill_template(&prompts.chat_user_template, &[("score_line", &score_line), ("question", question)]);
  format!("{}\n{}", prompts.chat_system.trim_end(), user)
}

/// `candidates[0].content.parts[0].text`, if present and non-blank.
pub fn extract_reply(body: &str) -> Option<String> {
  let parsed: GenerateResponse = serde_json::from_str(body).ok()?;
  let text = parsed
    .candidates
    .into_iter()
    .next()?
    .content?
    .parts
    .into_iter()
    .next()?
    .text?;
  let text = text.trim().to_string();
  (!text.is_empty()).then_some(text)
}

/// Clean error message from an upstream error body.
fn extract_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct GenerateRequest {
  contents: Vec<Content>,
}
#[derive(Serialize)]
struct Content { role: String, parts: Vec<Part> }
#[derive(Serialize)]
struct Part { text: String }

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)] candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
  #[serde(default)] content: Option<CandidateContent>,
}
#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)] parts: Vec<CandidatePart>,
}
#[derive(Deserialize)]
struct CandidatePart {
  #[serde(default)] text: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reply_is_first_candidate_text() {
    let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"  Chào bạn!  "},{"text":"ignored"}]}},{"content":{"parts":[{"text":"second"}]}}]}"#;
    assert_eq!(extract_reply(body).as_deref(), Some("Chào bạn!"));
  }

  #[test]
  fn empty_or_blocked_responses_have_no_reply() {
    assert_eq!(extract_reply(r#"{"candidates":[]}"#), None);
    assert_eq!(extract_reply(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#), None);
    assert_eq!(extract_reply(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#), None);
    assert_eq!(extract_reply(r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#), None);
    assert_eq!(extract_reply("not json"), None);
  }

  #[test]
  fn upstream_error_message_is_extracted() {
    let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
    assert_eq!(extract_error(body).as_deref(), Some("API key not valid"));
    assert_eq!(extract_error("<html>"), None);
  }

  #[test]
  fn prompt_carries_score_context_before_the_question() {
    let prompts = Prompts::default();
    let p = build_prompt(&prompts, "Tại sao mình hay làm theo bạn bè?", Some("Điểm khảo sát: 32/50"));
    let score_at = p.find("Điểm khảo sát: 32/50").unwrap();
    let question_at = p.find("Tại sao mình hay làm theo bạn bè?").unwrap();
    assert!(p.starts_with(prompts.chat_system.trim_end()));
    assert!(score_at < question_at);

    let bare = build_prompt(&prompts, "hi", None);
    assert!(!bare.contains("Điểm khảo sát"));
  }

  #[test]
  fn endpoint_tolerates_trailing_slash() {
    let g = Gemini {
      client: reqwest::Client::new(),
      api_key: "k".into(),
      base_url: "http://localhost:9/v1beta/".into(),
      model: "gemini-1.5-flash".into(),
    };
    assert_eq!(g.endpoint(), "http://localhost:9/v1beta/models/gemini-1.5-flash:generateContent");
  }
}
