//! Storage collaborator: surveys, responses, results and reviews.
//!
//! `SurveyStore` is the seam; `MemoryStore` keeps everything in RwLock-guarded
//! maps for the lifetime of the process.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{Profile, ResponseRecord, ResultRecord, Review, SurveyRecord, SurveyStatus};
use crate::error::StoreError;

/// How many reviews the board shows.
pub const REVIEW_PAGE: usize = 20;

#[async_trait]
pub trait SurveyStore: Send + Sync {
  /// Create a completed survey row for the profile and return it.
  async fn create_survey(&self, profile: &Profile) -> Result<SurveyRecord, StoreError>;
  async fn insert_responses(&self, responses: Vec<ResponseRecord>) -> Result<(), StoreError>;
  async fn insert_result(&self, result: ResultRecord) -> Result<(), StoreError>;
  async fn find_result(&self, survey_id: &str) -> Result<Option<ResultRecord>, StoreError>;
  async fn insert_review(&self, review: Review) -> Result<(), StoreError>;
  /// Newest first, at most `limit`.
  async fn recent_reviews(&self, limit: usize) -> Result<Vec<Review>, StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
  surveys: RwLock<HashMap<String, SurveyRecord>>,
  responses: RwLock<Vec<ResponseRecord>>,
  results: RwLock<HashMap<String, ResultRecord>>,
  reviews: RwLock<Vec<Review>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[cfg(test)]
impl MemoryStore {
  pub async fn survey(&self, id: &str) -> Option<SurveyRecord> {
    self.surveys.read().await.get(id).cloned()
  }

  pub async fn survey_count(&self) -> usize {
    self.surveys.read().await.len()
  }

  pub async fn responses_for(&self, survey_id: &str) -> Vec<ResponseRecord> {
    self.responses.read().await.iter().filter(|r| r.survey_id == survey_id).cloned().collect()
  }
}

#[async_trait]
impl SurveyStore for MemoryStore {
  #[instrument(level = "debug", skip(self, profile))]
  async fn create_survey(&self, profile: &Profile) -> Result<SurveyRecord, StoreError> {
    let now = Utc::now();
    let record = SurveyRecord {
      id: Uuid::new_v4().to_string(),
      profile: profile.clone(),
      status: SurveyStatus::Completed,
      created_at: now,
      completed_at: Some(now),
    };
    self.surveys.write().await.insert(record.id.clone(), record.clone());
    debug!(target: "survey", id = %record.id, "Survey row created");
    Ok(record)
  }

  #[instrument(level = "debug", skip(self, responses), fields(count = responses.len()))]
  async fn insert_responses(&self, responses: Vec<ResponseRecord>) -> Result<(), StoreError> {
    let surveys = self.surveys.read().await;
    if let Some(missing) = responses.iter().find(|r| !surveys.contains_key(&r.survey_id)) {
      return Err(StoreError::NotFound(format!("survey {}", missing.survey_id)));
    }
    self.responses.write().await.extend(responses);
    Ok(())
  }

  #[instrument(level = "debug", skip(self, result), fields(survey_id = %result.survey_id))]
  async fn insert_result(&self, result: ResultRecord) -> Result<(), StoreError> {
    if !self.surveys.read().await.contains_key(&result.survey_id) {
      return Err(StoreError::NotFound(format!("survey {}", result.survey_id)));
    }
    self.results.write().await.insert(result.survey_id.clone(), result);
    Ok(())
  }

  async fn find_result(&self, survey_id: &str) -> Result<Option<ResultRecord>, StoreError> {
    Ok(self.results.read().await.get(survey_id).cloned())
  }

  async fn insert_review(&self, review: Review) -> Result<(), StoreError> {
    self.reviews.write().await.push(review);
    Ok(())
  }

  async fn recent_reviews(&self, limit: usize) -> Result<Vec<Review>, StoreError> {
    let mut all = self.reviews.read().await.clone();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    all.truncate(limit);
    Ok(all)
  }
}
