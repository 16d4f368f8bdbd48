//! Generation boundary: hints and solutions with caching and fallbacks.
//!
//! Flow per request: cache lookup → (miss or forced) → knowledge + prompt → model →
//! parse → store. Entry points never return errors; a failed model call yields the
//! fixed fallback result, which is not cached.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::cache::{Cached, GenerationCache};
use crate::domain::{
  CodeAnalysis, HintLevel, HintRequest, HintResult, Question, SolutionRequest, SolutionResult, StandardSolution,
  DEFAULT_LANGUAGE,
};
use crate::fallback::{fallback_hint, fallback_solution};
use crate::knowledge::{KnowledgeGraph, KnowledgeReport};
use crate::model::{AskModel, ModelError};
use crate::parser::{parse_analysis, parse_hint, parse_solution};
use crate::prompts::PromptBuilder;
use crate::vocabulary::ConceptVocabulary;

/// Model names and defaults the engine runs with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
  pub default_language: String,
  pub hint_model: String,
  pub solution_model: String,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self {
      default_language: DEFAULT_LANGUAGE.into(),
      hint_model: "gpt-4o-mini".into(),
      solution_model: "gpt-4o".into(),
    }
  }
}

pub struct QaEngine {
  knowledge: KnowledgeGraph,
  prompts: PromptBuilder,
  model: Option<Arc<dyn AskModel>>,
  settings: EngineSettings,
  hints: GenerationCache<(i64, HintLevel), HintResult>,
  solutions: GenerationCache<i64, StandardSolution>,
}

impl QaEngine {
  pub fn new(vocab: Arc<ConceptVocabulary>, model: Option<Arc<dyn AskModel>>, settings: EngineSettings) -> Self {
    let knowledge = KnowledgeGraph::new(vocab);
    Self {
      prompts: PromptBuilder::new(knowledge.clone()),
      knowledge,
      model,
      settings,
      hints: GenerationCache::new(),
      solutions: GenerationCache::new(),
    }
  }

  pub fn model_enabled(&self) -> bool {
    self.model.is_some()
  }

  #[instrument(
    level = "info",
    skip(self, question, req),
    fields(question_id = req.question_id, level = %req.level, force_refresh = req.force_refresh, has_code = req.user_code.is_some())
  )]
  pub async fn generate_hint(&self, question: &Question, req: &HintRequest) -> HintResult {
    let language = self.language_for(req.language.as_deref());
    let key = (req.question_id, req.level);

    let outcome = self
      .hints
      .get_or_generate(key, req.force_refresh, || async move {
        let prompt = self.prompts.hint_prompt(
          &question.title,
          &question.description,
          req.level,
          req.user_code.as_deref(),
          Some(language),
        );
        let reply = self.ask(&self.settings.hint_model, &prompt).await?;
        Ok::<_, ModelError>(HintResult {
          question_id: req.question_id,
          level: req.level,
          content: parse_hint(&reply),
          has_next_level: req.level.has_next(),
          generated_at: Utc::now(),
          from_cache: false,
        })
      })
      .await;

    match outcome {
      Ok(Cached { value, from_cache }) => {
        info!(target: "qa", from_cache, content_len = value.content.len(), "Hint ready");
        HintResult { from_cache, ..(*value).clone() }
      }
      Err(e) => {
        warn!(target: "qa", error = %e, "Hint generation failed; serving fallback");
        HintResult {
          question_id: req.question_id,
          level: req.level,
          content: fallback_hint(req.level).into(),
          has_next_level: req.level.has_next(),
          generated_at: Utc::now(),
          from_cache: false,
        }
      }
    }
  }

  #[instrument(
    level = "info",
    skip(self, question, req),
    fields(question_id = req.question_id, force_refresh = req.force_refresh, has_code = req.user_code.is_some())
  )]
  pub async fn generate_solution(&self, question: &Question, req: &SolutionRequest) -> SolutionResult {
    let language = self.language_for(req.language.as_deref());

    let outcome = self
      .solutions
      .get_or_generate(req.question_id, req.force_refresh, || async move {
        let prompt = self.prompts.solution_prompt(&question.title, &question.description, Some(language));
        let reply = self.ask(&self.settings.solution_model, &prompt).await?;
        Ok::<_, ModelError>(parse_solution(&reply, language))
      })
      .await;

    let (standard_solution, from_cache) = match outcome {
      Ok(Cached { value, from_cache }) => ((*value).clone(), from_cache),
      Err(e) => {
        warn!(target: "qa", error = %e, "Solution generation failed; serving fallback");
        return SolutionResult {
          question_id: req.question_id,
          standard_solution: fallback_solution(),
          code_analysis: None,
          generated_at: Utc::now(),
          from_cache: false,
        };
      }
    };

    let code = req.user_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let code_analysis = match code {
      Some(code) => self.analyze_code(question, code, language).await,
      None => None,
    };

    info!(target: "qa", from_cache, analyzed = code_analysis.is_some(), "Solution ready");
    SolutionResult {
      question_id: req.question_id,
      standard_solution,
      code_analysis,
      generated_at: Utc::now(),
      from_cache,
    }
  }

  pub fn knowledge_report(&self, title: &str, description: &str, code: Option<&str>) -> KnowledgeReport {
    self.knowledge.report(title, description, code)
  }

  async fn analyze_code(&self, question: &Question, code: &str, language: &str) -> Option<CodeAnalysis> {
    let prompt = self.prompts.code_analysis_prompt(&question.title, &question.description, code, language);
    match self.ask(&self.settings.solution_model, &prompt).await {
      Ok(reply) => Some(parse_analysis(&reply)),
      Err(e) => {
        warn!(target: "qa", error = %e, "Code analysis failed; returning solution without it");
        None
      }
    }
  }

  async fn ask(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
    let client = self.model.as_ref().ok_or(ModelError::Disabled)?;
    let reply = client.ask(model, prompt).await?;
    if reply.trim().is_empty() {
      return Err(ModelError::EmptyResponse);
    }
    Ok(reply)
  }

  fn language_for<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
    requested
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .unwrap_or(self.settings.default_language.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::VecDeque;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use async_trait::async_trait;

  /// Replies are consumed in order; an exhausted script answers with a transport error.
  #[derive(Default)]
  struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    prompts: Mutex<Vec<(String, String)>>,
    calls: AtomicUsize,
  }

  impl ScriptedModel {
    fn with(replies: Vec<Result<&str, ModelError>>) -> Arc<Self> {
      let replies = replies.into_iter().map(|r| r.map(str::to_string)).collect();
      Arc::new(Self { replies: Mutex::new(replies), ..Default::default() })
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl AskModel for ScriptedModel {
    async fn ask(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.prompts.lock().unwrap().push((model.to_string(), prompt.to_string()));
      self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Err(ModelError::Transport("script exhausted".into())))
    }
  }

  fn engine(model: Option<Arc<ScriptedModel>>) -> QaEngine {
    let model = model.map(|m| m as Arc<dyn AskModel>);
    QaEngine::new(Arc::new(ConceptVocabulary::builtin()), model, EngineSettings::default())
  }

  fn two_sum() -> Question {
    Question { id: 1, title: "Two Sum".into(), description: "请使用哈希表求解".into(), difficulty: String::new() }
  }

  fn hint_req(level: HintLevel, force_refresh: bool) -> HintRequest {
    HintRequest { question_id: 1, level, user_code: None, language: None, force_refresh }
  }

  fn solution_req(user_code: Option<&str>, force_refresh: bool) -> SolutionRequest {
    SolutionRequest { question_id: 1, user_code: user_code.map(String::from), language: None, force_refresh }
  }

  const SOLUTION_REPLY: &str = "# 解题思路\n哈希表\n# 算法说明\n一次遍历\n# 复杂度分析\n时间复杂度：O(n)\n空间复杂度：O(n)\n# 关键点\n- 先查后存\n# 示例代码\n```cpp\nint main() {}\n```\n";

  #[tokio::test]
  async fn hint_is_cached_per_question_and_level() {
    let model = ScriptedModel::with(vec![Ok("  想想查找的代价。 "), Ok("第二级")]);
    let e = engine(Some(model.clone()));
    let q = two_sum();

    let first = e.generate_hint(&q, &hint_req(HintLevel::LIGHT, false)).await;
    assert_eq!(first.content, "想想查找的代价。");
    assert!(!first.from_cache);
    assert!(first.has_next_level);

    let again = e.generate_hint(&q, &hint_req(HintLevel::LIGHT, false)).await;
    assert!(again.from_cache);
    assert_eq!(again.content, first.content);
    assert_eq!(again.generated_at, first.generated_at);
    assert_eq!(model.calls(), 1);

    let other = e.generate_hint(&q, &hint_req(HintLevel::MEDIUM, false)).await;
    assert_eq!(other.content, "第二级");
    assert_eq!(model.calls(), 2);
  }

  #[tokio::test]
  async fn hint_uses_hint_model_and_knowledge_context() {
    let model = ScriptedModel::with(vec![Ok("ok")]);
    let e = engine(Some(model.clone()));
    e.generate_hint(&two_sum(), &hint_req(HintLevel::MEDIUM, false)).await;
    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts[0].0, "gpt-4o-mini");
    assert!(prompts[0].1.contains("哈希表"));
  }

  #[tokio::test]
  async fn forced_hint_regenerates_and_overwrites() {
    let model = ScriptedModel::with(vec![Ok("旧"), Ok("新")]);
    let e = engine(Some(model.clone()));
    let q = two_sum();
    e.generate_hint(&q, &hint_req(HintLevel::DEEP, false)).await;
    let forced = e.generate_hint(&q, &hint_req(HintLevel::DEEP, true)).await;
    assert_eq!(forced.content, "新");
    assert!(!forced.from_cache);
    assert!(!forced.has_next_level);
    let cached = e.generate_hint(&q, &hint_req(HintLevel::DEEP, false)).await;
    assert_eq!(cached.content, "新");
    assert!(cached.from_cache);
  }

  #[tokio::test]
  async fn failed_hint_falls_back_and_is_not_cached() {
    let model = ScriptedModel::with(vec![Err(ModelError::Http { status: 500, message: "boom".into() }), Ok("   "), Ok("真的")]);
    let e = engine(Some(model.clone()));
    let q = two_sum();

    let r = e.generate_hint(&q, &hint_req(HintLevel::MEDIUM, false)).await;
    assert_eq!(r.content, fallback_hint(HintLevel::MEDIUM));
    assert!(!r.from_cache);

    // Blank replies count as failures too.
    let r = e.generate_hint(&q, &hint_req(HintLevel::MEDIUM, false)).await;
    assert_eq!(r.content, fallback_hint(HintLevel::MEDIUM));

    let r = e.generate_hint(&q, &hint_req(HintLevel::MEDIUM, false)).await;
    assert_eq!(r.content, "真的");
    assert_eq!(model.calls(), 3);
  }

  #[tokio::test]
  async fn without_a_model_everything_falls_back() {
    let e = engine(None);
    assert!(!e.model_enabled());
    let q = two_sum();
    let h = e.generate_hint(&q, &hint_req(HintLevel::LIGHT, false)).await;
    assert_eq!(h.content, fallback_hint(HintLevel::LIGHT));
    let s = e.generate_solution(&q, &solution_req(Some("int main(){}"), false)).await;
    assert_eq!(s.standard_solution, fallback_solution());
    assert!(s.code_analysis.is_none());
    assert!(!s.from_cache);
  }

  #[tokio::test]
  async fn solution_is_cached_but_analysis_is_not() {
    let model = ScriptedModel::with(vec![Ok(SOLUTION_REPLY), Ok("# 评分\n88"), Ok("# 评分\n40")]);
    let e = engine(Some(model.clone()));
    let q = two_sum();

    let first = e.generate_solution(&q, &solution_req(Some("unordered_map<int,int> m;"), false)).await;
    assert!(!first.from_cache);
    assert_eq!(first.standard_solution.sample_code["C++"], "int main() {}");
    assert_eq!(first.code_analysis.as_ref().map(|a| a.score), Some(88));

    let second = e.generate_solution(&q, &solution_req(Some("for(;;){}"), false)).await;
    assert!(second.from_cache);
    assert_eq!(second.standard_solution, first.standard_solution);
    assert_eq!(second.code_analysis.map(|a| a.score), Some(40));
    assert_eq!(model.calls(), 3);

    let prompts = model.prompts.lock().unwrap();
    assert!(prompts.iter().all(|(m, _)| m == "gpt-4o"));
    assert!(prompts[2].1.contains("【诊断线索】"));
  }

  #[tokio::test]
  async fn analysis_failure_keeps_the_solution() {
    let model = ScriptedModel::with(vec![Ok(SOLUTION_REPLY), Err(ModelError::Transport("reset".into()))]);
    let e = engine(Some(model));
    let r = e.generate_solution(&two_sum(), &solution_req(Some("int x;"), false)).await;
    assert_eq!(r.standard_solution.approach, "哈希表");
    assert!(r.code_analysis.is_none());
  }

  #[tokio::test]
  async fn failed_solution_is_not_cached() {
    let model = ScriptedModel::with(vec![Err(ModelError::EmptyResponse), Ok(SOLUTION_REPLY)]);
    let e = engine(Some(model.clone()));
    let q = two_sum();
    let r = e.generate_solution(&q, &solution_req(None, false)).await;
    assert_eq!(r.standard_solution, fallback_solution());
    let r = e.generate_solution(&q, &solution_req(None, false)).await;
    assert!(!r.from_cache);
    assert_eq!(r.standard_solution.algorithm, "一次遍历");
  }

  #[tokio::test]
  async fn forced_solution_refresh_calls_the_model_again() {
    let model = ScriptedModel::with(vec![Ok(SOLUTION_REPLY), Ok("# 解题思路\n双指针\n")]);
    let e = engine(Some(model.clone()));
    let q = two_sum();
    e.generate_solution(&q, &solution_req(None, false)).await;
    let r = e.generate_solution(&q, &solution_req(None, true)).await;
    assert!(!r.from_cache);
    assert_eq!(r.standard_solution.approach, "双指针");
    assert_eq!(model.calls(), 2);
  }

  #[tokio::test]
  async fn requested_language_keys_sample_code() {
    let reply = "# 示例代码\n```python\nprint(1)\n```\n";
    let model = ScriptedModel::with(vec![Ok(reply)]);
    let e = engine(Some(model));
    let mut req = solution_req(None, false);
    req.language = Some("Python".into());
    let r = e.generate_solution(&two_sum(), &req).await;
    assert_eq!(r.standard_solution.sample_code["Python"], "print(1)");
  }

  #[test]
  fn knowledge_report_passes_through() {
    let e = engine(None);
    let r = e.knowledge_report("Two Sum", "哈希表", Some("unordered_map<int,int> m;"));
    assert!(r.gaps.is_empty());
    assert!(!r.detected.is_empty());
  }
}
