//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers); tighten for production
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    api_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

/// API routes with state attached, without the outer layers.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/questions", get(http::http_get_questions))
        .route("/api/v1/sessions", post(http::http_start_session))
        .route("/api/v1/sessions/:id", get(http::http_get_session))
        .route("/api/v1/sessions/:id/answers", post(http::http_post_answer))
        .route("/api/v1/sessions/:id/next", post(http::http_post_next))
        .route("/api/v1/sessions/:id/previous", post(http::http_post_previous))
        .route("/api/v1/sessions/:id/submit", post(http::http_post_submit))
        .route("/api/v1/surveys", post(http::http_post_survey))
        .route("/api/v1/results/:survey_id", get(http::http_get_result))
        .route("/api/v1/tiers/:level", get(http::http_get_tier))
        .route("/api/v1/reviews", get(http::http_get_reviews).post(http::http_post_review))
        .route("/api/v1/chat", post(http::http_post_chat))
        .route("/api/v1/situation", get(http::http_get_situation))
        .route("/api/v1/heart-rate", get(http::http_get_heart_rate).post(http::http_post_heart_rate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::from_parts(AppConfig::default(), Arc::new(MemoryStore::new()), None);
        api_router(Arc::new(state))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn profile() -> Value {
        json!({ "name": "Linh", "age": 15, "grade": "10A1", "school": "THPT Nguyễn Du" })
    }

    #[tokio::test]
    async fn health_and_catalog() {
        let app = app();
        let (status, body) = call(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);

        let (_, body) = call(&app, "GET", "/api/v1/questions", None).await;
        assert_eq!(body["questions"].as_array().unwrap().len(), 13);
        assert_eq!(body["maxScore"], 50);
        assert_eq!(body["questions"][5]["type"], "multiple_choice");
    }

    #[tokio::test]
    async fn wizard_flow_over_http() {
        let app = app();
        let (status, session) = call(&app, "POST", "/api/v1/sessions", Some(json!({ "profile": profile() }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["state"], "answering");
        assert_eq!(session["index"], 1);
        assert_eq!(session["currentQuestion"]["id"], "q1");
        let id = session["id"].as_str().unwrap().to_string();

        let (status, err) = call(&app, "POST", &format!("/api/v1/sessions/{id}/next"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err["error"].as_str().unwrap().contains("q1"));

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/answers"),
            Some(json!({ "questionId": "q1", "value": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        for i in 1..=13 {
            let value = match i {
                6 | 7 | 10 => json!(1),
                11..=13 => json!("Mình sẽ từ chối."),
                _ => json!(4),
            };
            let (status, _) = call(
                &app,
                "POST",
                &format!("/api/v1/sessions/{id}/answers"),
                Some(json!({ "questionId": format!("q{i}"), "value": value })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let (status, _) = call(&app, "POST", &format!("/api/v1/sessions/{id}/next"), None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, session) = call(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(session["state"], "submitting");

        let (status, result) = call(&app, "POST", &format!("/api/v1/sessions/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        // 7 likert * 4 + 3 choices at index 1 (4 points each)
        assert_eq!(result["totalScore"], 40);
        assert_eq!(result["riskLevel"], "high");
        assert_eq!(result["recommendations"].as_array().unwrap().len(), 4);
        assert_eq!(result["display"]["title"], "Mức Độ Cao");

        let survey_id = result["surveyId"].as_str().unwrap();
        let (status, loaded) = call(&app, "GET", &format!("/api/v1/results/{survey_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["totalScore"], 40);

        let (status, _) = call(&app, "POST", &format!("/api/v1/sessions/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn one_shot_survey_and_unknown_result() {
        let app = app();
        let (status, result) = call(
            &app,
            "POST",
            "/api/v1/surveys",
            Some(json!({ "profile": profile(), "answers": { "q1": 5, "q6": 0, "q11": "không biết" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(result["totalScore"], 10);
        assert_eq!(result["riskLevel"], "low");

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/surveys",
            Some(json!({ "profile": profile(), "answers": { "q1": 6 } })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(&app, "GET", "/api/v1/results/does-not-exist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "GET", "/api/v1/sessions/does-not-exist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reviews_board() {
        let app = app();
        let (status, _) = call(&app, "POST", "/api/v1/reviews", Some(json!({ "name": "Bảo", "rating": 6, "comment": "ok" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for rating in [5, 3] {
            let (status, _) =
                call(&app, "POST", "/api/v1/reviews", Some(json!({ "name": "Bảo", "rating": rating, "comment": "Bổ ích" }))).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (_, board) = call(&app, "GET", "/api/v1/reviews", None).await;
        assert_eq!(board["count"], 2);
        assert_eq!(board["averageRating"], 4.0);
    }

    #[tokio::test]
    async fn tier_lookup_falls_back_to_medium() {
        let app = app();
        let (status, high) = call(&app, "GET", "/api/v1/tiers/high", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(high["recommendations"].as_array().unwrap().len(), 4);
        let (_, odd) = call(&app, "GET", "/api/v1/tiers/extreme", None).await;
        let (_, medium) = call(&app, "GET", "/api/v1/tiers/medium", None).await;
        assert_eq!(odd["recommendations"], medium["recommendations"]);
        assert_eq!(odd["display"], medium["display"]);
        assert_eq!(odd["level"], "extreme");
    }

    #[tokio::test]
    async fn chat_situation_and_heart_rate() {
        let app = app();
        let (status, _) = call(&app, "POST", "/api/v1/chat", Some(json!({ "message": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, reply) = call(&app, "POST", "/api/v1/chat", Some(json!({ "message": "Chào", "score": 20 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!reply["reply"].as_str().unwrap().is_empty());

        let (status, situation) = call(&app, "GET", "/api/v1/situation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(situation["text"].as_str().unwrap().ends_with('?'));

        let (_, beats) = call(&app, "GET", "/api/v1/heart-rate", None).await;
        assert_eq!(beats["samples"].as_array().unwrap().len(), 1);
        let (status, _) = call(&app, "POST", "/api/v1/heart-rate", Some(json!({ "bpm": 400 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, sample) = call(&app, "POST", "/api/v1/heart-rate", Some(json!({ "bpm": 95 }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sample["bpm"], 95);
    }
}
