use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session id used when a request does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Inbound chat turn for `POST /route`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub user_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl RouteRequest {
    pub fn new<S: Into<String>>(user_input: S, session_id: Option<String>) -> Self {
        Self { user_input: user_input.into(), session_id }
    }

    /// Session key this request belongs to, falling back to the shared default.
    pub fn session_key(&self) -> &str {
        self.session_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SESSION_ID)
    }
}

/// Outbound answer for one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub need_city_confirmation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl RouteResponse {
    pub fn ok<S: Into<String>>(message: S, session_id: &str) -> Self {
        Self {
            success: true,
            message: message.into(),
            need_city_confirmation: false,
            session_id: Some(session_id.to_string()),
        }
    }

    pub fn failure<S: Into<String>>(message: S, session_id: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            need_city_confirmation: false,
            session_id: Some(session_id.to_string()),
        }
    }

    /// A question the user has to answer before planning can continue.
    pub fn ask_city<S: Into<String>>(message: S, session_id: &str) -> Self {
        Self {
            success: true,
            message: message.into(),
            need_city_confirmation: true,
            session_id: Some(session_id.to_string()),
        }
    }
}

/// Body of the legacy `POST /route/confirm-city` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityConfirmation {
    pub session_id: String,
    pub city_input: String,
}

/// Result of `DELETE /session/{id}`; returned whether or not the id existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearSessionResponse {
    pub message: String,
    pub existed: bool,
}

/// Read-only view of a session, served by `GET /session/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub stage: String, // start|waiting_city|processing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}
