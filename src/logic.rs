//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Driving survey sessions through their transitions
//!   - Submitting surveys and reading results back
//!   - The reviews board
//!   - Chat assistant replies (upstream or offline)

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{AnswerValue, Answers, Profile, Review};
use crate::error::{AppError, ChatError, ReviewError, SessionError, StoreError};
use crate::protocol::{result_out, ResultOut, ReviewIn, ReviewsOut};
use crate::scoring::{max_score, MAX_POINTS_PER_QUESTION};
use crate::session::{check_answer, persist_survey, SurveySession};
use crate::state::AppState;
use crate::store::REVIEW_PAGE;
use crate::util::round1;

// -------- Sessions --------

#[instrument(level = "info", skip(state, profile))]
pub async fn start_session(state: &AppState, profile: Profile) -> Result<SurveySession, AppError> {
  state.prune_sessions(Utc::now()).await;
  let session = SurveySession::new().submit_profile(profile, &state.catalog)?;
  state.put_session(session.clone()).await;
  info!(target: "survey", id = %session.id, "Survey session started");
  Ok(session)
}

/// Apply a synchronous transition under the sessions write lock.
async fn transition<F>(state: &AppState, id: &str, f: F) -> Result<SurveySession, AppError>
where
  F: FnOnce(&SurveySession) -> Result<SurveySession, SessionError>,
{
  let mut sessions = state.sessions.write().await;
  let current = sessions.get(id).ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
  if current.in_flight {
    return Err(SessionError::SubmitInFlight.into());
  }
  let next = f(current)?;
  debug!(target: "survey", %id, from = current.state.name(), to = next.state.name(), "Session transition");
  sessions.insert(id.to_string(), next.clone());
  Ok(next)
}

#[instrument(level = "info", skip(state, value), fields(%id, %question_id))]
pub async fn answer_question(
  state: &AppState,
  id: &str,
  question_id: &str,
  value: AnswerValue,
) -> Result<SurveySession, AppError> {
  transition(state, id, |s| s.answer(&state.catalog, question_id, value)).await
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn next_question(state: &AppState, id: &str) -> Result<SurveySession, AppError> {
  transition(state, id, |s| s.next(&state.catalog)).await
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn previous_question(state: &AppState, id: &str) -> Result<SurveySession, AppError> {
  transition(state, id, |s| s.previous(&state.catalog)).await
}

/// Score and persist a session that reached `submitting`.
///
/// The session is claimed under the write lock, the store calls run without
/// it, and a completed session is dropped from the map. Its result stays
/// reachable by survey id.
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn submit_session(state: &AppState, id: &str) -> Result<ResultOut, AppError> {
  let claimed = transition(state, id, SurveySession::claim_submit).await?;
  let (next, outcome) = claimed.submit(state.store.as_ref(), &state.catalog).await;

  let mut sessions = state.sessions.write().await;
  match outcome {
    Ok(record) => {
      sessions.remove(id);
      debug!(target: "survey", %id, survey_id = %record.survey_id, "Completed session evicted");
      Ok(result_out(&record, max_score(&state.catalog)))
    }
    Err(e) => {
      sessions.insert(id.to_string(), next);
      Err(e.into())
    }
  }
}

/// One-shot submission: profile and full answer set in a single call.
#[instrument(level = "info", skip(state, profile, answers), fields(answers = answers.len()))]
pub async fn submit_survey(state: &AppState, profile: Profile, answers: Answers) -> Result<ResultOut, AppError> {
  profile.validate().map_err(SessionError::InvalidProfile)?;
  for question in state.catalog.iter() {
    if let Some(value) = answers.get(&question.id) {
      check_answer(question, value)?;
    }
  }
  let record = persist_survey(state.store.as_ref(), &state.catalog, &profile, &answers).await?;
  Ok(result_out(&record, max_score(&state.catalog)))
}

#[instrument(level = "info", skip(state), fields(%survey_id))]
pub async fn load_result(state: &AppState, survey_id: &str) -> Result<ResultOut, AppError> {
  let record = state
    .store
    .find_result(survey_id)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("result for survey {}", survey_id)))?;
  Ok(result_out(&record, max_score(&state.catalog)))
}

// -------- Reviews --------

pub fn validate_review(input: &ReviewIn) -> Result<(), ReviewError> {
  if input.name.trim().is_empty() {
    return Err(ReviewError::MissingName);
  }
  if input.comment.trim().is_empty() {
    return Err(ReviewError::MissingComment);
  }
  if !(1..=5).contains(&input.rating) {
    return Err(ReviewError::RatingOutOfRange(input.rating));
  }
  Ok(())
}

#[instrument(level = "info", skip(state, input), fields(rating = input.rating))]
pub async fn post_review(state: &AppState, input: ReviewIn) -> Result<Review, AppError> {
  validate_review(&input)?;
  let review = Review {
    id: Uuid::new_v4().to_string(),
    name: input.name.trim().to_string(),
    rating: input.rating,
    comment: input.comment.trim().to_string(),
    created_at: Utc::now(),
  };
  state.store.insert_review(review.clone()).await?;
  info!(target: "herdcheck", id = %review.id, rating = review.rating, "Review stored");
  Ok(review)
}

#[instrument(level = "info", skip(state))]
pub async fn list_reviews(state: &AppState) -> Result<ReviewsOut, AppError> {
  let reviews = state.store.recent_reviews(REVIEW_PAGE).await?;
  let average_rating = if reviews.is_empty() {
    0.0
  } else {
    round1(reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / reviews.len() as f64)
  };
  Ok(ReviewsOut { count: reviews.len(), average_rating, reviews })
}

// -------- Chat --------

/// Context line prepended to the question when the respondent shares a score.
pub fn score_line(score: u32, total_questions: Option<u32>, default_max: u32) -> String {
  let max = total_questions.map(|n| n.saturating_mul(MAX_POINTS_PER_QUESTION)).unwrap_or(default_max);
  format!("Điểm khảo sát: {}/{}", score, max)
}

#[instrument(level = "info", skip(state, message), fields(message_len = message.len(), has_score = score.is_some()))]
pub async fn do_chat_reply(
  state: &AppState,
  message: &str,
  score: Option<u32>,
  total_questions: Option<u32>,
) -> Result<String, ChatError> {
  let message = message.trim();
  if message.is_empty() {
    return Err(ChatError::EmptyMessage);
  }
  let context = score.map(|s| score_line(s, total_questions, max_score(&state.catalog)));

  let Some(g) = &state.gemini else {
    debug!(target: "herdcheck", "Chat reply via offline text.");
    return Ok(state.prompts.offline_reply.clone());
  };

  match g.assistant_reply(&state.prompts, message, context.as_deref()).await {
    Ok(reply) => Ok(reply),
    Err(ChatError::NoReply) => {
      warn!(target: "herdcheck", "Upstream produced no reply; sending apology text.");
      Ok(state.prompts.no_reply.clone())
    }
    Err(e) => Err(e),
  }
}
