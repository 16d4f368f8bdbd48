//! HTTP endpoint handlers. These are thin wrappers that validate input and forward to the engine.
//! Each handler is instrumented and logs ids and basic result info.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::{HintResult, Question, SolutionRequest, SolutionResult};
use crate::knowledge::KnowledgeReport;
use crate::protocol::*;
use crate::routes::ApiError;
use crate::state::AppState;
use crate::util::trunc_for_log;

const FEATURES: [&str; 4] = ["渐进式提示（3级）", "AI题解生成", "代码分析", "优化建议"];

async fn find_question(state: &AppState, id: i64) -> Result<Question, ApiError> {
  if id <= 0 {
    return Err(ApiError::InvalidQuestionId);
  }
  state.questions.get(id).await.ok_or(ApiError::QuestionNotFound(id))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    service: "QAService",
    status: "healthy",
    timestamp: Utc::now(),
    features: FEATURES.to_vec(),
    questions: state.questions.len().await,
    model_enabled: state.engine.model_enabled(),
  })
}

#[instrument(level = "info", skip(state, body), fields(question_id = body.question_id, level = body.level, force_refresh = body.force_refresh))]
pub async fn http_post_hint(
  State(state): State<Arc<AppState>>,
  Json(body): Json<HintIn>,
) -> Result<Json<HintResult>, ApiError> {
  if body.question_id <= 0 {
    return Err(ApiError::InvalidQuestionId);
  }
  let req = body.into_request().map_err(|_| ApiError::InvalidLevel)?;
  let question = find_question(&state, req.question_id).await?;
  info!(target: "qa", id = question.id, title = %trunc_for_log(&question.title, 60), language = ?req.language, "Generating hint");

  let hint = state.engine.generate_hint(&question, &req).await;
  info!(target: "qa", id = hint.question_id, level = %hint.level, from_cache = hint.from_cache, "HTTP hint served");
  Ok(Json(hint))
}

#[instrument(level = "info", skip(state, body), fields(question_id = body.question_id, has_code = body.user_code.is_some()))]
pub async fn http_post_solution(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SolutionIn>,
) -> Result<Json<SolutionResult>, ApiError> {
  let question = find_question(&state, body.question_id).await?;
  let req = SolutionRequest::from(body);
  info!(target: "qa", id = question.id, title = %trunc_for_log(&question.title, 60), "Generating solution");

  let solution = state.engine.generate_solution(&question, &req).await;
  info!(target: "qa", id = solution.question_id, from_cache = solution.from_cache, analyzed = solution.code_analysis.is_some(), "HTTP solution served");
  Ok(Json(solution))
}

#[instrument(level = "info", skip(state, body), fields(question_id = body.question_id, has_code = body.user_code.is_some()))]
pub async fn http_post_knowledge(
  State(state): State<Arc<AppState>>,
  Json(body): Json<KnowledgeIn>,
) -> Result<Json<KnowledgeReport>, ApiError> {
  let question = find_question(&state, body.question_id).await?;
  let report = state.engine.knowledge_report(&question.title, &question.description, body.user_code.as_deref());
  info!(target: "knowledge", id = question.id, concepts = report.concepts.len(), gaps = report.gaps.len(), "HTTP knowledge report served");
  Ok(Json(report))
}
