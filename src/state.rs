//! Application state: catalog, storage, sessions, chat client and the decorative monitors.
//!
//! This module owns:
//!   - the question catalog (from TOML or the shipped one)
//!   - the storage collaborator
//!   - in-flight survey sessions by id
//!   - the prompts struct (from TOML or defaults)
//!   - optional Gemini client
//!
//! Sessions are replaced wholesale on every transition; a failed transition
//! leaves the stored value as it was.

use std::{collections::HashMap, sync::Arc};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::{load_config_from_env, AppConfig, Prompts};
use crate::domain::Question;
use crate::error::SessionError;
use crate::gemini::Gemini;
use crate::heart::HeartMonitor;
use crate::scoring::scored_question_count;
use crate::session::SurveySession;
use crate::situations::SituationBank;
use crate::store::{MemoryStore, SurveyStore};

/// Sessions untouched for this long are dropped.
const SESSION_TTL_MINUTES: i64 = 120;

pub struct AppState {
    pub catalog: Arc<Vec<Question>>,
    pub store: Arc<dyn SurveyStore>,
    pub sessions: RwLock<HashMap<String, SurveySession>>,
    pub situations: SituationBank,
    pub heart: HeartMonitor,
    pub gemini: Option<Gemini>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, pick the catalog, init the chat client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env().unwrap_or_default();

        let gemini = Gemini::from_env();
        if let Some(g) = &gemini {
            info!(target: "herdcheck", base_url = %g.base_url, model = %g.model, "Chat assistant enabled.");
        } else {
            info!(target: "herdcheck", "Chat assistant disabled (no GEMINI_API_KEY). Using offline reply.");
        }

        Self::from_parts(cfg, Arc::new(MemoryStore::new()), gemini)
    }

    /// Assemble state from explicit pieces (used by `new` and by tests).
    pub fn from_parts(cfg: AppConfig, store: Arc<dyn SurveyStore>, gemini: Option<Gemini>) -> Self {
        let catalog = cfg.catalog();
        let situations = SituationBank::new(cfg.situations());
        info!(
            target: "survey",
            questions = catalog.len(),
            scored = scored_question_count(&catalog),
            situations = situations.len(),
            "Startup survey inventory"
        );

        Self {
            catalog: Arc::new(catalog),
            store,
            sessions: RwLock::new(HashMap::new()),
            situations,
            heart: HeartMonitor::new(),
            gemini,
            prompts: cfg.prompts,
        }
    }

    /// Read-only access to a session by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_session(&self, id: &str) -> Result<SurveySession, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))
    }

    /// Drop abandoned sessions older than the TTL. Sessions mid-submit are kept.
    pub async fn prune_sessions(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::minutes(SESSION_TTL_MINUTES);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.in_flight || s.started_at > cutoff);
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(target: "survey", pruned, remaining = sessions.len(), "Stale sessions pruned");
        }
        pruned
    }

    #[instrument(level = "debug", skip(self, session), fields(id = %session.id, state = session.state.name()))]
    pub async fn put_session(&self, session: SurveySession) {
        self.sessions.write().await.insert(session.id.clone(), session);
    }
}
