//! Survey session state machine.
//!
//! `CollectingProfile -> Answering { index } -> Submitting -> Complete`
//!
//! A session is a plain value. Every transition borrows the current one and
//! returns the next, so a failed transition leaves the caller holding the old
//! session untouched. `index` is 1-based, matching the question counter shown
//! to the respondent.
//!
//! Submission is split in two store steps: the survey row with its responses,
//! then the derived result. Once the first step succeeds the survey id is kept
//! on the session, so a retry after a failed result write reuses it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{
  Analysis, AnswerValue, Answers, Profile, Question, QuestionKind, ResponseRecord, ResultRecord,
};
use crate::error::{SessionError, StoreError};
use crate::scoring::assess;
use crate::store::SurveyStore;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
  CollectingProfile,
  Answering { index: usize },
  Submitting,
  Complete { survey_id: String },
}

impl SessionState {
  pub fn name(&self) -> &'static str {
    match self {
      SessionState::CollectingProfile => "collecting_profile",
      SessionState::Answering { .. } => "answering",
      SessionState::Submitting => "submitting",
      SessionState::Complete { .. } => "complete",
    }
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct SurveySession {
  pub id: String,
  pub state: SessionState,
  pub profile: Option<Profile>,
  pub answers: Answers,
  pub started_at: DateTime<Utc>,
  /// Survey row already written by an earlier, partially failed submit.
  #[serde(skip)]
  pub pending_survey_id: Option<String>,
  /// Set while a submit runs outside the sessions lock.
  #[serde(skip)]
  pub in_flight: bool,
}

impl SurveySession {
  pub fn new() -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      state: SessionState::CollectingProfile,
      profile: None,
      answers: Answers::new(),
      started_at: Utc::now(),
      pending_survey_id: None,
      in_flight: false,
    }
  }

  fn with_state(&self, state: SessionState) -> Self {
    Self { state, ..self.clone() }
  }

  fn wrong_state(&self, action: &'static str) -> SessionError {
    SessionError::WrongState { action, state: self.state.name() }
  }

  /// Accept the respondent profile and move to the first question.
  pub fn submit_profile(&self, profile: Profile, catalog: &[Question]) -> Result<Self, SessionError> {
    if self.state != SessionState::CollectingProfile {
      return Err(self.wrong_state("submit a profile"));
    }
    profile.validate().map_err(SessionError::InvalidProfile)?;
    let state = if catalog.is_empty() { SessionState::Submitting } else { SessionState::Answering { index: 1 } };
    Ok(Self { profile: Some(profile), ..self.with_state(state) })
  }

  /// Record (or replace) the answer to a catalog question.
  pub fn answer(&self, catalog: &[Question], question_id: &str, value: AnswerValue) -> Result<Self, SessionError> {
    if !matches!(self.state, SessionState::Answering { .. }) {
      return Err(self.wrong_state("answer"));
    }
    let question = catalog
      .iter()
      .find(|q| q.id == question_id)
      .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))?;
    check_answer(question, &value)?;
    let mut next = self.clone();
    next.answers.insert(question_id.to_string(), value);
    Ok(next)
  }

  /// The question currently on screen, if any.
  pub fn current_question<'c>(&self, catalog: &'c [Question]) -> Option<&'c Question> {
    match self.state {
      SessionState::Answering { index } => catalog.get(index.checked_sub(1)?),
      _ => None,
    }
  }

  /// Advance past the current question; past the last one the session is submitting.
  pub fn next(&self, catalog: &[Question]) -> Result<Self, SessionError> {
    let SessionState::Answering { index } = self.state else {
      return Err(self.wrong_state("advance"));
    };
    if let Some(q) = self.current_question(catalog) {
      if !self.answers.contains_key(&q.id) {
        return Err(SessionError::Unanswered(q.id.clone()));
      }
    }
    let state = if index >= catalog.len() { SessionState::Submitting } else { SessionState::Answering { index: index + 1 } };
    Ok(self.with_state(state))
  }

  /// Step back one question. No-op on the first; from `Submitting` it returns to the last,
  /// unless responses were already written.
  pub fn previous(&self, catalog: &[Question]) -> Result<Self, SessionError> {
    match self.state {
      SessionState::Answering { index } if index > 1 => Ok(self.with_state(SessionState::Answering { index: index - 1 })),
      SessionState::Answering { .. } => Ok(self.clone()),
      SessionState::Submitting if !catalog.is_empty() && self.pending_survey_id.is_none() => {
        Ok(self.with_state(SessionState::Answering { index: catalog.len() }))
      }
      _ => Err(self.wrong_state("go back")),
    }
  }

  /// Mark the session as submitting in the background. Rejects a second claim.
  pub fn claim_submit(&self) -> Result<Self, SessionError> {
    if self.state != SessionState::Submitting {
      return Err(self.wrong_state("submit"));
    }
    if self.in_flight {
      return Err(SessionError::SubmitInFlight);
    }
    Ok(Self { in_flight: true, ..self.clone() })
  }

  /// Run the scoring pipeline and persist it. Only valid while submitting.
  ///
  /// Always hands back the session to keep: `Complete` on success, otherwise
  /// still submitting (with the survey id, if that part was written).
  pub async fn submit(
    &self,
    store: &dyn SurveyStore,
    catalog: &[Question],
  ) -> (Self, Result<ResultRecord, SubmitError>) {
    let mut next = Self { in_flight: false, ..self.clone() };
    if self.state != SessionState::Submitting {
      return (next, Err(self.wrong_state("submit").into()));
    }
    let Some(profile) = self.profile.as_ref() else {
      return (next, Err(self.wrong_state("submit without a profile").into()));
    };

    let survey_id = match &self.pending_survey_id {
      Some(id) => id.clone(),
      None => match persist_responses(store, catalog, profile, &self.answers).await {
        Ok(id) => id,
        Err(e) => return (next, Err(e.into())),
      },
    };
    next.pending_survey_id = Some(survey_id.clone());

    match persist_result(store, catalog, &survey_id, &self.answers).await {
      Ok(record) => {
        next.pending_survey_id = None;
        next.state = SessionState::Complete { survey_id };
        (next, Ok(record))
      }
      Err(e) => (next, Err(e.into())),
    }
  }
}

/// Domain check for a collected answer.
pub fn check_answer(question: &Question, value: &AnswerValue) -> Result<(), SessionError> {
  question
    .check_answer(value)
    .map_err(|reason| SessionError::InvalidAnswer { question_id: question.id.clone(), reason })
}

impl Default for SurveySession {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
  #[error(transparent)]
  Session(#[from] SessionError),
  #[error(transparent)]
  Store(#[from] StoreError),
}

impl From<SubmitError> for crate::error::AppError {
  fn from(value: SubmitError) -> Self {
    match value {
      SubmitError::Session(e) => e.into(),
      SubmitError::Store(e) => e.into(),
    }
  }
}

/// Persist survey, responses and the derived result, in that order.
pub async fn persist_survey(
  store: &dyn SurveyStore,
  catalog: &[Question],
  profile: &Profile,
  answers: &Answers,
) -> Result<ResultRecord, StoreError> {
  let survey_id = persist_responses(store, catalog, profile, answers).await?;
  persist_result(store, catalog, &survey_id, answers).await
}

/// Create the survey row and store every answer. Returns the survey id.
#[instrument(level = "info", skip_all, fields(answers = answers.len()))]
pub async fn persist_responses(
  store: &dyn SurveyStore,
  catalog: &[Question],
  profile: &Profile,
  answers: &Answers,
) -> Result<String, StoreError> {
  let survey = store.create_survey(profile).await?;

  let responses: Vec<ResponseRecord> = answers
    .iter()
    .map(|(question_id, answer)| ResponseRecord {
      survey_id: survey.id.clone(),
      question_id: question_id.clone(),
      question_type: catalog
        .iter()
        .find(|q| &q.id == question_id)
        .map(|q| q.kind)
        .unwrap_or(QuestionKind::Likert),
      answer: answer.clone(),
    })
    .collect();
  store.insert_responses(responses).await?;
  Ok(survey.id)
}

/// Compute the (score, tier, advice) triple once and write it verbatim.
#[instrument(level = "info", skip(store, catalog, answers))]
pub async fn persist_result(
  store: &dyn SurveyStore,
  catalog: &[Question],
  survey_id: &str,
  answers: &Answers,
) -> Result<ResultRecord, StoreError> {
  let assessment = assess(catalog, answers);
  let record = ResultRecord {
    id: Uuid::new_v4().to_string(),
    survey_id: survey_id.to_string(),
    total_score: assessment.score,
    risk_level: assessment.level.as_str().to_string(),
    recommendations: assessment.recommendations,
    analysis: Analysis { score: assessment.score, answers: answers.clone() },
    created_at: Utc::now(),
  };
  store.insert_result(record.clone()).await?;

  info!(target: "survey", %survey_id, score = record.total_score, risk = %record.risk_level, "Survey result stored");
  Ok(record)
}
