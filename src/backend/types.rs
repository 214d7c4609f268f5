//! Wire types exchanged with the chat backend

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a chat session
///
/// The backend may use integers or strings. The original form is kept so
/// the identifier is echoed back exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionId {
    /// Numeric identifier
    Int(i64),
    /// Opaque string identifier
    Text(String),
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Int(n) => write!(f, "{}", n),
            SessionId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for SessionId {
    type Err = std::convert::Infallible;

    /// Parse user input, preferring the numeric form when it fits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => SessionId::Int(n),
            Err(_) => SessionId::Text(trimmed.to_string()),
        })
    }
}

impl From<i64> for SessionId {
    fn from(n: i64) -> Self {
        SessionId::Int(n)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId::Text(s.to_string())
    }
}

/// A conversation thread as listed by `GET /sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,
    /// System prompt, if one was set
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Creation time
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// One window of the session list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPage {
    /// Authoritative total number of sessions on the backend
    pub total: usize,
    /// Sessions for the requested offset window, in backend order
    pub data: Vec<Session>,
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sent by the person at the keyboard
    User,
    /// Completion returned by the model
    Assistant,
    /// Instruction injected by the backend
    System,
}

impl Role {
    /// Heading shown above a message in the thread view
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Bot",
            Role::System => "System",
        }
    }
}

/// A single message in a session thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: Role,
    /// Message text (may contain light markdown)
    pub content: String,
    /// Backend timestamp as sent; absent for locally appended messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    /// A locally composed user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: None,
        }
    }

    /// A locally appended assistant reply
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Session to continue; the backend creates one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// User message text
    pub content: String,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    /// Assistant reply text
    pub reply: String,
    /// Session the exchange was stored in
    pub session: SessionId,
    /// Full thread after the exchange
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Body of `POST /set_system_prompt`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptUpdate {
    /// Target session
    pub session_id: SessionId,
    /// New system prompt
    pub system_prompt: String,
}

/// Response of `POST /set_system_prompt`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromptUpdateAck {
    /// Backend status string, `"updated"` on success
    pub status: String,
    /// Session that was updated
    pub session_id: SessionId,
    /// Prompt as stored
    pub system_prompt: String,
}

/// Response of `POST /reset`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResetAck {
    /// Backend status string, `"reset"` on success
    pub status: String,
    /// Session whose history was cleared
    pub session_id: SessionId,
}

/// FastAPI-style error body
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

/// Accept RFC 3339 timestamps and offset-less ISO-8601 ones (read as UTC)
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp {:?}: {}", raw, e))
}
