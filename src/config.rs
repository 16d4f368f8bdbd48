//! Loading service configuration (engine settings, extra vocabulary, question rows) from TOML.
//!
//! See `QaConfig` for the expected schema. Every section is optional.

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::Question;
use crate::engine::EngineSettings;
use crate::vocabulary::Concept;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QaConfig {
  #[serde(default)]
  pub engine: EngineCfg,
  #[serde(default)]
  pub vocabulary: VocabularyCfg,
  #[serde(default)]
  pub questions: Vec<Question>,
}

/// `[engine]`: anything left out keeps the env/default value.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct EngineCfg {
  #[serde(default)] pub default_language: Option<String>,
  #[serde(default)] pub hint_model: Option<String>,
  #[serde(default)] pub solution_model: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct VocabularyCfg {
  #[serde(default)]
  pub keywords: Vec<KeywordCfg>,
}

/// One `[[vocabulary.keywords]]` row; concepts are variant names such as "HashTable".
#[derive(Clone, Debug, Deserialize)]
pub struct KeywordCfg {
  pub keyword: String,
  pub concepts: Vec<Concept>,
}

impl EngineCfg {
  /// Overlay this section on top of `base`, ignoring blank values.
  pub fn apply(&self, mut base: EngineSettings) -> EngineSettings {
    let pick = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    if let Some(lang) = pick(&self.default_language) {
      base.default_language = lang;
    }
    if let Some(m) = pick(&self.hint_model) {
      base.hint_model = m;
    }
    if let Some(m) = pick(&self.solution_model) {
      base.solution_model = m;
    }
    base
  }
}

impl VocabularyCfg {
  pub fn keyword_rows(&self) -> Vec<(String, Vec<Concept>)> {
    self.keywords.iter().map(|k| (k.keyword.clone(), k.concepts.clone())).collect()
  }
}

/// Parse a TOML string, dropping question rows with a non-positive id.
pub fn parse_config(text: &str) -> Result<QaConfig, toml::de::Error> {
  let mut cfg = toml::from_str::<QaConfig>(text)?;
  cfg.questions.retain(|q| {
    if q.id <= 0 {
      warn!(target: "qa", id = q.id, title = %q.title, "Skipping config question with non-positive id");
    }
    q.id > 0
  });
  Ok(cfg)
}

/// Attempt to load `QaConfig` from QA_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<QaConfig> {
  let path = std::env::var("QA_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "qa", %path, questions = cfg.questions.len(), keywords = cfg.vocabulary.keywords.len(), "Loaded QA config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "qa", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "qa", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"
[engine]
default_language = "Python"
hint_model = "  "

[[vocabulary.keywords]]
keyword = "Memoization"
concepts = ["Memoization", "DynamicProgramming"]

[[questions]]
id = 10
title = "Climb"
description = "dp"

[[questions]]
id = 0
title = "broken"
description = ""
"#;

  #[test]
  fn full_config_parses() {
    let cfg = parse_config(SAMPLE).unwrap();
    assert_eq!(cfg.questions.len(), 1);
    assert_eq!(cfg.questions[0].id, 10);
    assert_eq!(cfg.vocabulary.keyword_rows()[0].1, vec![Concept::Memoization, Concept::DynamicProgramming]);

    let settings = cfg.engine.apply(EngineSettings::default());
    assert_eq!(settings.default_language, "Python");
    // Blank override keeps the default.
    assert_eq!(settings.hint_model, "gpt-4o-mini");
  }

  #[test]
  fn empty_config_is_default() {
    let cfg = parse_config("").unwrap();
    assert!(cfg.questions.is_empty());
    assert_eq!(cfg.engine.apply(EngineSettings::default()), EngineSettings::default());
  }

  #[test]
  fn unknown_concept_is_rejected() {
    let bad = "[[vocabulary.keywords]]\nkeyword = \"x\"\nconcepts = [\"Quantum\"]\n";
    assert!(parse_config(bad).is_err());
  }
}
