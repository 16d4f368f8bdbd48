//! Public protocol structs for the HTTP endpoints (serde ready).
//! Request bodies are validated by the handlers, so ids and levels arrive as plain integers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{HintLevel, HintRequest, InvalidHintLevel, SolutionRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintIn {
    #[serde(default)]
    pub question_id: i64,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub user_code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl HintIn {
    pub fn into_request(self) -> Result<HintRequest, InvalidHintLevel> {
        Ok(HintRequest {
            question_id: self.question_id,
            level: HintLevel::try_from(self.level)?,
            user_code: self.user_code,
            language: self.language,
            force_refresh: self.force_refresh,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionIn {
    #[serde(default)]
    pub question_id: i64,
    #[serde(default)]
    pub user_code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

impl From<SolutionIn> for SolutionRequest {
    fn from(s: SolutionIn) -> Self {
        SolutionRequest {
            question_id: s.question_id,
            user_code: s.user_code,
            language: s.language,
            force_refresh: s.force_refresh,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeIn {
    #[serde(default)]
    pub question_id: i64,
    #[serde(default)]
    pub user_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub service: &'static str,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub features: Vec<&'static str>,
    pub questions: usize,
    #[serde(rename = "modelEnabled")]
    pub model_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: String,
}
