//! Wire shapes of the model's JSON replies.

use serde::Deserialize;

use orchestrator_core::model::{CityAnalysis, IntentResult, LocationPair, UNANALYSED_CITY};

const UNKNOWN_REASON: &str = "未知原因";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "intent_type", rename_all = "snake_case")]
pub enum IntentPayload {
    RouteRequest {
        #[serde(default)]
        locations: Vec<String>,
    },
    Correction {
        #[serde(default)]
        correction_info: String,
        #[serde(default)]
        suggested_address: String,
    },
    Other {
        #[serde(default)]
        reason: Option<String>,
    },
}

impl From<IntentPayload> for IntentResult {
    fn from(payload: IntentPayload) -> Self {
        match payload {
            IntentPayload::RouteRequest { locations } => IntentResult::RouteRequest { locations },
            IntentPayload::Correction { correction_info, suggested_address } => {
                IntentResult::Correction { correction_info, suggested_address }
            }
            IntentPayload::Other { reason } => IntentResult::Other {
                reason: reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_REASON.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityPayload {
    #[serde(default = "default_need_user_input")]
    pub need_user_input: bool,
    #[serde(default)]
    pub suggested_city_info: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
}

fn default_need_user_input() -> bool {
    true
}

impl CityPayload {
    /// Missing question or analysis text is filled from the generic fallback.
    pub fn into_analysis(self, locations: &LocationPair) -> CityAnalysis {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        if !self.need_user_input {
            return CityAnalysis::Resolved {
                suggested_city_info: self.suggested_city_info.unwrap_or_default(),
                analysis: self.analysis.unwrap_or_default(),
            };
        }
        CityAnalysis::NeedsInput {
            question: non_empty(self.question).unwrap_or_else(|| CityAnalysis::fallback_question(locations)),
            analysis: non_empty(self.analysis).unwrap_or_else(|| UNANALYSED_CITY.to_string()),
        }
    }
}
