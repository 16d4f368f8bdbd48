//! Application state: the question store and the QA engine.
//!
//! This module owns:
//!   - the in-memory question store (seeds, TOML rows, optional JSON bank)
//!   - the engine, built from the vocabulary, config and optional model client
//!
//! Question sources are applied in order and later ones replace earlier ones by id.

use std::{collections::HashMap, path::Path, sync::Arc};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::{load_config_from_env, QaConfig};
use crate::domain::Question;
use crate::engine::{EngineSettings, QaEngine};
use crate::fallback::seed_questions;
use crate::model::{AskModel, OpenAiClient};
use crate::util::strip_html;
use crate::vocabulary::ConceptVocabulary;

#[derive(Clone, Default)]
pub struct QuestionStore {
    by_id: Arc<RwLock<HashMap<i64, Question>>>,
}

impl QuestionStore {
    pub fn from_questions<I: IntoIterator<Item = Question>>(questions: I) -> Self {
        let map = questions.into_iter().map(|q| (q.id, q)).collect();
        Self { by_id: Arc::new(RwLock::new(map)) }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: i64) -> Option<Question> {
        self.by_id.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.by_id.read().await.len()
    }
}

/// Question entry as found in a JSON problem bank. Field names are accepted in
/// either lower camel or Pascal case; extra fields (examples, tags, limits) are ignored.
#[derive(Debug, Deserialize)]
struct BankQuestion {
    #[serde(alias = "Id")]
    id: i64,
    #[serde(alias = "Title")]
    title: String,
    #[serde(default, alias = "Description")]
    description: String,
    #[serde(default, alias = "Difficulty")]
    difficulty: String,
}

/// Parse a JSON bank (array of questions). Descriptions are flattened from HTML.
pub fn parse_question_bank(json: &str) -> Result<Vec<Question>, serde_json::Error> {
    let rows: Vec<BankQuestion> = serde_json::from_str(json)?;
    Ok(rows
        .into_iter()
        .filter(|r| r.id > 0)
        .map(|r| Question {
            id: r.id,
            title: r.title,
            description: strip_html(&r.description),
            difficulty: r.difficulty,
        })
        .collect())
}

fn load_question_bank(path: &Path) -> Vec<Question> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(target: "qa", path = %path.display(), error = %e, "Question bank not readable; skipping");
            return Vec::new();
        }
    };
    match parse_question_bank(&text) {
        Ok(qs) => {
            info!(target: "qa", path = %path.display(), count = qs.len(), "Loaded question bank");
            qs
        }
        Err(e) => {
            error!(target: "qa", path = %path.display(), error = %e, "Failed to parse question bank");
            Vec::new()
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub questions: QuestionStore,
    pub engine: Arc<QaEngine>,
}

impl AppState {
    /// Build state from env: load config, assemble questions and vocabulary, init the model client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_config_from_env().unwrap_or_default();
        let bank = std::env::var("QUESTIONS_PATH")
            .ok()
            .map(|p| load_question_bank(Path::new(&p)))
            .unwrap_or_default();

        let client = OpenAiClient::from_env();
        let mut settings = EngineSettings::default();
        if let Some(oa) = &client {
            info!(target: "qa", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "Model client enabled.");
            settings.hint_model = oa.fast_model.clone();
            settings.solution_model = oa.strong_model.clone();
        } else {
            info!(target: "qa", "Model client disabled (no OPENAI_API_KEY). Serving fallback hints and solutions.");
        }
        let model = client.map(|c| Arc::new(c) as Arc<dyn AskModel>);

        Self::build(cfg, bank, model, settings)
    }

    /// Assemble state from already-loaded parts.
    pub fn build(cfg: QaConfig, bank: Vec<Question>, model: Option<Arc<dyn AskModel>>, settings: EngineSettings) -> Self {
        let settings = cfg.engine.apply(settings);
        let vocab = ConceptVocabulary::builtin().with_extra_keywords(cfg.vocabulary.keyword_rows());

        let mut by_id = HashMap::<i64, Question>::new();
        let (mut seeds, mut configured, mut banked) = (0usize, 0usize, 0usize);
        for q in seed_questions() {
            seeds += 1;
            by_id.insert(q.id, q);
        }
        for q in cfg.questions {
            configured += 1;
            by_id.insert(q.id, q);
        }
        for q in bank {
            banked += 1;
            by_id.insert(q.id, q);
        }
        info!(target: "qa", seeds, configured, banked, total = by_id.len(), "Startup question inventory");
        info!(target: "qa", language = %settings.default_language, hint_model = %settings.hint_model, solution_model = %settings.solution_model, "Engine settings");

        Self {
            questions: QuestionStore::from_questions(by_id.into_values()),
            engine: Arc::new(QaEngine::new(Arc::new(vocab), model, settings)),
        }
    }
}
