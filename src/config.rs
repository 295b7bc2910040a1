//! Loading app configuration (prompts, question catalog, situation bank) from TOML.
//!
//! See `AppConfig` and `Prompts` for the expected schema. Every section is optional.
//!
//! ```toml
//! situations = ["Bạn bè rủ bạn ..."]
//!
//! [prompts]
//! no_reply = "..."
//!
//! [[questions]]
//! id = "q1"
//! type = "likert"
//! text = "..."
//! category = "conformity"
//! ```

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::Question;
use crate::seeds::{default_catalog, default_situations, validate_catalog};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub questions: Vec<Question>,
  #[serde(default)]
  pub situations: Vec<String>,
}

/// Text used around the chat assistant. Defaults target Vietnamese-speaking students.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub chat_system: String,
  /// Placeholders: `{score_line}` (may be empty) and `{question}`.
  pub chat_user_template: String,
  /// Shown when the upstream answered but produced no text.
  pub no_reply: String,
  /// Shown when no upstream is configured.
  pub offline_reply: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      chat_system: "Bạn là trợ lý AI chuyên về tâm lý học sinh, thanh thiếu niên và hành vi bầy đàn. \
                    Hãy trả lời bằng tiếng Việt một cách thân thiện, dễ hiểu và hữu ích cho học sinh. \
                    Viết vừa đủ ý, dẫn dắt bằng ví dụ gần gũi và kết thúc bằng một câu hỏi mở."
        .into(),
      chat_user_template: "{score_line}Câu hỏi: {question}".into(),
      no_reply: "Rất tiếc, AI chưa phản hồi được. Bạn thử hỏi lại sau nhé!".into(),
      offline_reply: "Trợ lý AI hiện chưa được kết nối. Trong lúc chờ, hãy thử tự hỏi: \
                      nếu không ai nhìn thấy, mình có còn chọn như vậy không?"
        .into(),
    }
  }
}

impl AppConfig {
  /// Catalog to serve: the configured one if present and valid, else the shipped one.
  pub fn catalog(&self) -> Vec<Question> {
    if self.questions.is_empty() {
      return default_catalog();
    }
    match validate_catalog(&self.questions) {
      Ok(()) => {
        info!(target: "herdcheck", count = self.questions.len(), "Using configured question catalog");
        self.questions.clone()
      }
      Err(e) => {
        error!(target: "herdcheck", error = %e, "Configured question catalog is invalid; using the shipped catalog");
        default_catalog()
      }
    }
  }

  pub fn situations(&self) -> Vec<String> {
    let configured: Vec<String> = self
      .situations
      .iter()
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect();
    if configured.is_empty() {
      if !self.situations.is_empty() {
        warn!(target: "herdcheck", "Configured situations are all blank; using the shipped bank");
      }
      default_situations()
    } else {
      configured
    }
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from HERDCHECK_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("HERDCHECK_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "herdcheck", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "herdcheck", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "herdcheck", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
