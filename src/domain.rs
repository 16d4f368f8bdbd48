//! Domain models: questions, hint / solution requests, and the structured results the engine returns.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Language used for prompts and code when the caller does not name one.
pub const DEFAULT_LANGUAGE: &str = "C++";

/// A problem as supplied by the question store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
  pub id: i64,
  pub title: String,
  pub description: String,
  #[serde(default)] pub difficulty: String,
}

/// Disclosure level of a hint: 1 (direction only), 2 (prose steps), 3 (near-complete approach).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct HintLevel(u8);

impl HintLevel {
  pub const LIGHT: HintLevel = HintLevel(1);
  pub const MEDIUM: HintLevel = HintLevel(2);
  pub const DEEP: HintLevel = HintLevel(3);

  pub fn get(self) -> u8 { self.0 }

  pub fn has_next(self) -> bool { self.0 < 3 }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("hint level must be between 1 and 3, got {0}")]
pub struct InvalidHintLevel(pub i64);

impl TryFrom<i64> for HintLevel {
  type Error = InvalidHintLevel;

  fn try_from(v: i64) -> Result<Self, Self::Error> {
    match v {
      1..=3 => Ok(HintLevel(v as u8)),
      _ => Err(InvalidHintLevel(v)),
    }
  }
}

impl From<HintLevel> for u8 {
  fn from(l: HintLevel) -> u8 { l.0 }
}

impl fmt::Display for HintLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Validated hint request (the caller layer has already checked id and level).
#[derive(Clone, Debug)]
pub struct HintRequest {
  pub question_id: i64,
  pub level: HintLevel,
  pub user_code: Option<String>,
  pub language: Option<String>,
  pub force_refresh: bool,
}

#[derive(Clone, Debug)]
pub struct SolutionRequest {
  pub question_id: i64,
  pub user_code: Option<String>,
  pub language: Option<String>,
  pub force_refresh: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HintResult {
  pub question_id: i64,
  pub level: HintLevel,
  pub content: String,
  pub has_next_level: bool,
  pub generated_at: DateTime<Utc>,
  pub from_cache: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StandardSolution {
  pub approach: String,
  pub algorithm: String,
  pub time_complexity: String,
  pub space_complexity: String,
  /// Sample code keyed by language name (e.g. "C++").
  pub sample_code: BTreeMap<String, String>,
  pub key_points: Vec<String>,
}

/// Score used when the review carries no usable score.
pub const UNKNOWN_SCORE: u8 = 60;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CodeAnalysis {
  pub overall_review: String,
  pub correctness: String,
  pub time_complexity: String,
  pub space_complexity: String,
  pub suggestions: Vec<String>,
  /// 0..=100; `UNKNOWN_SCORE` when the model gave none.
  pub score: u8,
}

impl Default for CodeAnalysis {
  fn default() -> Self {
    Self {
      overall_review: String::new(),
      correctness: String::new(),
      time_complexity: String::new(),
      space_complexity: String::new(),
      suggestions: Vec::new(),
      score: UNKNOWN_SCORE,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolutionResult {
  pub question_id: i64,
  pub standard_solution: StandardSolution,
  pub code_analysis: Option<CodeAnalysis>,
  pub generated_at: DateTime<Utc>,
  /// True when the standard solution was served from the cache.
  #[serde(default)] pub from_cache: bool,
}

/// Language to use for prompts/code: the caller's choice if non-blank, else `DEFAULT_LANGUAGE`.
pub fn effective_language(language: Option<&str>) -> &str {
  language.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(DEFAULT_LANGUAGE)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hint_level_bounds() {
    assert!(HintLevel::try_from(0).is_err());
    assert!(HintLevel::try_from(4).is_err());
    assert!(HintLevel::try_from(-1).is_err());
    assert_eq!(HintLevel::try_from(2).unwrap(), HintLevel::MEDIUM);
    assert!(HintLevel::LIGHT.has_next());
    assert!(!HintLevel::DEEP.has_next());
    assert_eq!(HintLevel::try_from(5).unwrap_err().to_string(), "hint level must be between 1 and 3, got 5");
  }

  #[test]
  fn hint_level_serde_validates() {
    let l: HintLevel = serde_json::from_str("3").unwrap();
    assert_eq!(l, HintLevel::DEEP);
    assert!(serde_json::from_str::<HintLevel>("7").is_err());
    assert_eq!(serde_json::to_string(&HintLevel::MEDIUM).unwrap(), "2");
  }

  #[test]
  fn hint_result_uses_camel_case() {
    let r = HintResult {
      question_id: 7,
      level: HintLevel::LIGHT,
      content: "x".into(),
      has_next_level: true,
      generated_at: Utc::now(),
      from_cache: false,
    };
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v["questionId"], 7);
    assert_eq!(v["hasNextLevel"], true);
    assert_eq!(v["fromCache"], false);
  }

  #[test]
  fn effective_language_falls_back() {
    assert_eq!(effective_language(None), "C++");
    assert_eq!(effective_language(Some("  ")), "C++");
    assert_eq!(effective_language(Some("Python")), "Python");
  }
}
