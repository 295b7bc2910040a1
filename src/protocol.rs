//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AnswerValue, Answers, HeartSample, Profile, Question, ResultRecord, Review};
use crate::scoring::{tier_display_for_label, TierDisplay};
use crate::session::{SessionState, SurveySession};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Chat {
        message: String,
        #[serde(default)]
        score: Option<u32>,
        #[serde(default, rename = "totalQuestions")]
        total_questions: Option<u32>,
    },
    Situation,
    HeartRate,
}

impl ClientWsMessage {
    /// Variant name for logs; payloads are never logged.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientWsMessage::Ping => "ping",
            ClientWsMessage::Chat { .. } => "chat",
            ClientWsMessage::Situation => "situation",
            ClientWsMessage::HeartRate => "heart_rate",
        }
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    ChatReply { reply: String },
    Situation { text: String },
    HeartRate { sample: HeartSample, recent: Vec<HeartSample> },
    Error { message: String },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionsOut {
    pub questions: Vec<Question>,
    #[serde(rename = "maxScore")]
    pub max_score: u32,
}

#[derive(Deserialize)]
pub struct StartSessionIn {
    pub profile: Profile,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub value: AnswerValue,
}

/// Session as the wizard needs it: state, progress and the question on screen.
#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub id: String,
    #[serde(flatten)]
    pub state: SessionState,
    pub answered: usize,
    pub total: usize,
    #[serde(rename = "currentQuestion", skip_serializing_if = "Option::is_none")]
    pub current_question: Option<Question>,
    pub answers: Answers,
}

pub fn session_out(s: &SurveySession, catalog: &[Question]) -> SessionOut {
    SessionOut {
        id: s.id.clone(),
        state: s.state.clone(),
        answered: s.answers.len(),
        total: catalog.len(),
        current_question: s.current_question(catalog).cloned(),
        answers: s.answers.clone(),
    }
}

#[derive(Deserialize)]
pub struct SubmitSurveyIn {
    pub profile: Profile,
    #[serde(default)]
    pub answers: Answers,
}

/// Persisted result plus the tier's display copy.
#[derive(Debug, Serialize)]
pub struct ResultOut {
    #[serde(rename = "surveyId")]
    pub survey_id: String,
    #[serde(rename = "totalScore")]
    pub total_score: u32,
    #[serde(rename = "maxScore")]
    pub max_score: u32,
    #[serde(rename = "riskLevel")]
    pub risk_level: String,
    pub recommendations: Vec<String>,
    pub display: TierDisplay,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

pub fn result_out(r: &ResultRecord, max_score: u32) -> ResultOut {
    ResultOut {
        survey_id: r.survey_id.clone(),
        total_score: r.total_score,
        max_score,
        risk_level: r.risk_level.clone(),
        recommendations: r.recommendations.clone(),
        display: tier_display_for_label(&r.risk_level),
        created_at: r.created_at,
    }
}

#[derive(Debug, Serialize)]
pub struct TierOut {
    pub level: String,
    pub recommendations: Vec<String>,
    pub display: TierDisplay,
}

#[derive(Deserialize)]
pub struct ReviewIn {
    pub name: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewsOut {
    pub reviews: Vec<Review>,
    pub count: usize,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
}

#[derive(Deserialize)]
pub struct ChatIn {
    pub message: String,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default, rename = "totalQuestions")]
    pub total_questions: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ChatOut {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct SituationOut {
    pub text: String,
}

#[derive(Deserialize)]
pub struct HeartRateIn {
    pub bpm: u16,
}

#[derive(Debug, Serialize)]
pub struct HeartRateOut {
    pub samples: Vec<HeartSample>,
}
