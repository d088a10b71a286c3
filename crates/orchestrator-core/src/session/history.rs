use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Turns kept per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: SessionEventType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEventType {
    UserInput(String),
    SystemResponse { success: bool, text: String },
    StageChange { from: String, to: String },
}

/// Bounded log of what happened in one conversation, oldest dropped first.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    events: VecDeque<SessionEvent>,
    max_events: usize,
}

impl SessionHistory {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(64)),
            max_events: max_events.max(1),
        }
    }

    pub fn add_event(&mut self, event_type: SessionEventType) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(SessionEvent { timestamp: Utc::now(), event_type });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of user turns still held in the window.
    pub fn turn_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.event_type, SessionEventType::UserInput(_)))
            .count()
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
