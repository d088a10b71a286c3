use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::history::{SessionEventType, SessionHistory};
use crate::error::PipelineError;
use crate::model::{CityAnalysis, IntentResult, LocationPair};

/// Position of a conversation in the orchestration protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Initial and terminal: the next message is classified.
    Start,
    /// A city question is outstanding; the next message answers it.
    WaitingCity,
    /// Pipeline in flight. Only observable while a pass holds the session.
    Processing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::WaitingCity => "waiting_city",
            Stage::Processing => "processing",
        }
    }

    pub fn can_transition_to(&self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Start, Stage::WaitingCity)
                | (Stage::WaitingCity, Stage::Processing)
                | (_, Stage::Start)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything remembered about one conversation.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub stage: Stage,
    pub locations: Option<LocationPair>,
    pub intent: Option<IntentResult>,
    pub city_analysis: Option<CityAnalysis>,
    pub history: SessionHistory,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionState {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            stage: Stage::Start,
            locations: None,
            intent: None,
            city_analysis: None,
            history: SessionHistory::default(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Move to `next`, refusing transitions the protocol does not allow.
    pub fn advance(&mut self, next: Stage) -> Result<(), PipelineError> {
        if !self.stage.can_transition_to(next) {
            return Err(PipelineError::SessionStateCorrupted);
        }
        self.record_stage(next);
        Ok(())
    }

    /// Back to START with the route-request data dropped. History is kept.
    pub fn reset(&mut self) {
        self.record_stage(Stage::Start);
        self.locations = None;
        self.intent = None;
        self.city_analysis = None;
    }

    fn record_stage(&mut self, next: Stage) {
        if self.stage != next {
            self.history.add_event(SessionEventType::StageChange {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }
        self.stage = next;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
