//! Router assembly: QA endpoints, CORS, HTTP tracing, and the API error type.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::protocol::ErrorOut;
use crate::state::AppState;

pub mod http;

/// Caller-side validation failures. Messages are the user-facing Chinese texts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("无效的题目ID")]
    InvalidQuestionId,
    #[error("提示等级必须在1-3之间")]
    InvalidLevel,
    #[error("题目 {0} 不存在")]
    QuestionNotFound(i64),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidQuestionId | ApiError::InvalidLevel => StatusCode::BAD_REQUEST,
            ApiError::QuestionNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(target: "qa", status = status.as_u16(), error = %self, "Request rejected");
        (status, Json(ErrorOut { error: self.to_string() })).into_response()
    }
}

/// Build the application router with:
/// - QA API under `/api/qa/...`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/qa/health", get(http::http_health))
        .route("/api/qa/hint", post(http::http_post_hint))
        .route("/api/qa/solution", post(http::http_post_solution))
        .route("/api/qa/knowledge", post(http::http_post_knowledge))
        .with_state(state)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::QaConfig;
    use crate::engine::EngineSettings;

    fn app() -> Router {
        let state = AppState::build(QaConfig::default(), Vec::new(), None, EngineSettings::default());
        build_router(Arc::new(state))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri).header("content-type", "application/json");
        let req = match body {
            Some(v) => req.body(Body::from(v.to_string())).unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_lists_features() {
        let (status, body) = call(app(), "GET", "/api/qa/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["modelEnabled"], false);
        assert_eq!(body["features"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn hint_validation_errors() {
        let (status, body) = call(app(), "POST", "/api/qa/hint", Some(serde_json::json!({"questionId": 0, "level": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "无效的题目ID");

        let (status, body) = call(app(), "POST", "/api/qa/hint", Some(serde_json::json!({"questionId": 1, "level": 4}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "提示等级必须在1-3之间");

        let (status, body) = call(app(), "POST", "/api/qa/hint", Some(serde_json::json!({"questionId": 999, "level": 1}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "题目 999 不存在");
    }

    #[tokio::test]
    async fn offline_hint_serves_the_fallback() {
        let (status, body) = call(app(), "POST", "/api/qa/hint", Some(serde_json::json!({"questionId": 1, "level": 3}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questionId"], 1);
        assert_eq!(body["level"], 3);
        assert_eq!(body["hasNextLevel"], false);
        assert_eq!(body["fromCache"], false);
        assert!(body["content"].as_str().unwrap().starts_with("提示："));
    }

    #[tokio::test]
    async fn solution_rejects_unknown_question() {
        let (status, _) = call(app(), "POST", "/api/qa/solution", Some(serde_json::json!({"questionId": -4}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(app(), "POST", "/api/qa/solution", Some(serde_json::json!({"questionId": 12345}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn offline_solution_is_the_placeholder() {
        let (status, body) = call(app(), "POST", "/api/qa/solution", Some(serde_json::json!({"questionId": 1, "userCode": "int main(){}"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["standardSolution"]["keyPoints"][0], "请联系管理员");
        assert!(body["codeAnalysis"].is_null());
    }

    #[tokio::test]
    async fn knowledge_report_for_seed_question() {
        let (status, body) = call(app(), "POST", "/api/qa/knowledge", Some(serde_json::json!({"questionId": 1, "userCode": "for (;;) {}"}))).await;
        assert_eq!(status, StatusCode::OK);
        let concepts: Vec<&str> = body["concepts"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
        assert!(concepts.contains(&"HashTable"));
        let gaps: Vec<&str> = body["gaps"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
        assert!(gaps.contains(&"HashTable"));
    }

    #[test]
    fn api_errors_map_to_status() {
        assert_eq!(ApiError::InvalidLevel.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::QuestionNotFound(3).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::QuestionNotFound(3).to_string(), "题目 3 不存在");
    }
}
