//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs identifiers and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::logic::*;
use crate::protocol::*;
use crate::scoring::{max_score, recommend_for_label, tier_display_for_label};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_questions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(QuestionsOut { questions: state.catalog.as_ref().clone(), max_score: max_score(&state.catalog) })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartSessionIn>,
) -> Result<impl IntoResponse, AppError> {
  let session = start_session(&state, body.profile).await?;
  Ok((StatusCode::CREATED, Json(session_out(&session, &state.catalog))))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
  let session = state.get_session(&id).await?;
  Ok(Json(session_out(&session, &state.catalog)))
}

#[instrument(level = "info", skip(state, body), fields(%id, question_id = %body.question_id))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> Result<impl IntoResponse, AppError> {
  let session = answer_question(&state, &id, &body.question_id, body.value).await?;
  Ok(Json(session_out(&session, &state.catalog)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_next(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
  let session = next_question(&state, &id).await?;
  Ok(Json(session_out(&session, &state.catalog)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_previous(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
  let session = previous_question(&state, &id).await?;
  Ok(Json(session_out(&session, &state.catalog)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
  let result = submit_session(&state, &id).await?;
  info!(target: "survey", session = %id, survey_id = %result.survey_id, score = result.total_score, risk = %result.risk_level, "HTTP session submitted");
  Ok((StatusCode::CREATED, Json(result)))
}

#[instrument(level = "info", skip(state, body), fields(answers = body.answers.len()))]
pub async fn http_post_survey(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitSurveyIn>,
) -> Result<impl IntoResponse, AppError> {
  let result = submit_survey(&state, body.profile, body.answers).await?;
  info!(target: "survey", survey_id = %result.survey_id, score = result.total_score, risk = %result.risk_level, "HTTP survey submitted");
  Ok((StatusCode::CREATED, Json(result)))
}

#[instrument(level = "info", skip(state), fields(%survey_id))]
pub async fn http_get_result(
  State(state): State<Arc<AppState>>,
  Path(survey_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
  Ok(Json(load_result(&state, &survey_id).await?))
}

/// Advice and display copy for a tier label; unknown labels get the medium tier.
#[instrument(level = "info", fields(%level))]
pub async fn http_get_tier(Path(level): Path<String>) -> impl IntoResponse {
  Json(TierOut {
    display: tier_display_for_label(&level),
    recommendations: recommend_for_label(&level),
    level,
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_reviews(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
  Ok(Json(list_reviews(&state).await?))
}

#[instrument(level = "info", skip(state, body), fields(rating = body.rating, comment_len = body.comment.len()))]
pub async fn http_post_review(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ReviewIn>,
) -> Result<impl IntoResponse, AppError> {
  let review = post_review(&state, body).await?;
  Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(level = "info", skip(state, body), fields(message_len = body.message.len(), has_score = body.score.is_some()))]
pub async fn http_post_chat(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatIn>,
) -> Result<impl IntoResponse, AppError> {
  let reply = do_chat_reply(&state, &body.message, body.score, body.total_questions).await?;
  Ok(Json(ChatOut { reply }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_situation(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
  let text = state
    .situations
    .pick()
    .await
    .ok_or_else(|| AppError::Store(crate::error::StoreError::NotFound("situation".into())))?;
  Ok(Json(SituationOut { text }))
}

/// Each poll produces one simulated beat and returns the window.
#[instrument(level = "info", skip(state))]
pub async fn http_get_heart_rate(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  state.heart.tick().await;
  Json(HeartRateOut { samples: state.heart.recent().await })
}

#[instrument(level = "info", skip(state, body), fields(bpm = body.bpm))]
pub async fn http_post_heart_rate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<HeartRateIn>,
) -> Result<impl IntoResponse, AppError> {
  let sample = state.heart.record(body.bpm).await.map_err(AppError::BadRequest)?;
  Ok((StatusCode::CREATED, Json(sample)))
}
