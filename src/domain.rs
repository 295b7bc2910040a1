//! Domain models: questions, answers, risk tiers, respondent profile and the
//! records handed to the storage collaborator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a question is answered (and whether it is scored).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
  /// Five-point agreement scale, answered 1..=5.
  Likert,
  /// Pick one of `options`, answered with a zero-based index.
  MultipleChoice,
  /// Free text. Never scored.
  OpenEnded,
}

impl QuestionKind {
  pub fn is_scored(self) -> bool {
    !matches!(self, QuestionKind::OpenEnded)
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: QuestionKind,
  pub text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  #[serde(default)]
  pub category: String,
}

impl Question {
  pub fn option_count(&self) -> usize {
    self.options.as_ref().map_or(0, Vec::len)
  }

  /// Check a payload against the declared kind: likert 1..=5, a valid option
  /// index for multiple choice, text for open ended.
  pub fn check_answer(&self, value: &AnswerValue) -> Result<(), String> {
    match (self.kind, value) {
      (QuestionKind::Likert, AnswerValue::Number(n)) if (1..=5).contains(n) => Ok(()),
      (QuestionKind::Likert, _) => Err("expected an integer between 1 and 5".into()),
      (QuestionKind::MultipleChoice, AnswerValue::Number(n))
        if usize::try_from(*n).is_ok_and(|i| i < self.option_count()) =>
      {
        Ok(())
      }
      (QuestionKind::MultipleChoice, _) => {
        Err(format!("expected an option index below {}", self.option_count()))
      }
      (QuestionKind::OpenEnded, AnswerValue::Text(_)) => Ok(()),
      (QuestionKind::OpenEnded, _) => Err("expected text".into()),
    }
  }
}

/// Raw answer payload as sent by the client.
///
/// The payload is checked against the question's declared kind only at scoring
/// time; anything that doesn't fit lands in `Other` and scores zero.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnswerValue {
  Number(i64),
  Text(String),
  Other(serde_json::Value),
}

impl AnswerValue {
  pub fn as_number(&self) -> Option<i64> {
    match self {
      AnswerValue::Number(n) => Some(*n),
      _ => None,
    }
  }
}

/// Full answer set keyed by question id.
pub type Answers = HashMap<String, AnswerValue>;

/// Ordered risk tiers: `Low < Medium < High < Critical`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
  Critical,
}

impl RiskLevel {
  pub const ALL: [RiskLevel; 4] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical];

  pub fn as_str(self) -> &'static str {
    match self {
      RiskLevel::Low => "low",
      RiskLevel::Medium => "medium",
      RiskLevel::High => "high",
      RiskLevel::Critical => "critical",
    }
  }

  /// Parse a stored/transmitted label. Unknown labels yield `None`.
  pub fn from_label(label: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|lvl| lvl.as_str().eq_ignore_ascii_case(label.trim()))
  }
}

impl std::fmt::Display for RiskLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Respondent details collected before the first question.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
  pub name: String,
  pub age: u32,
  pub grade: String,
  #[serde(default)]
  pub school: Option<String>,
}

pub const MIN_AGE: u32 = 10;
pub const MAX_AGE: u32 = 25;

impl Profile {
  pub fn validate(&self) -> Result<(), String> {
    if self.name.trim().is_empty() {
      return Err("name is required".into());
    }
    if self.grade.trim().is_empty() {
      return Err("grade is required".into());
    }
    if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
      return Err(format!("age must be between {} and {}", MIN_AGE, MAX_AGE));
    }
    Ok(())
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
  Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurveyRecord {
  pub id: String,
  pub profile: Profile,
  pub status: SurveyStatus,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseRecord {
  pub survey_id: String,
  pub question_id: String,
  pub question_type: QuestionKind,
  pub answer: AnswerValue,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Analysis {
  pub score: u32,
  pub answers: Answers,
}

/// Derived (score, tier, advice) triple as persisted. Never recomputed.
///
/// `risk_level` stays a label so records written by other clients with an
/// unexpected tier can still be read back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultRecord {
  pub id: String,
  pub survey_id: String,
  pub total_score: u32,
  pub risk_level: String,
  pub recommendations: Vec<String>,
  pub analysis: Analysis,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Review {
  pub id: String,
  pub name: String,
  pub rating: u8,
  pub comment: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartSample {
  pub at: DateTime<Utc>,
  pub bpm: u16,
}
