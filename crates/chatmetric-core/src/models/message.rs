use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Epoch values above this are read as milliseconds, below as seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Who authored a message in a survey conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Assistant,
    User,
}

impl Role {
    /// Parse a stored role value. Empty and unknown roles yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "assistant" => Some(Role::Assistant),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event read from the record store, already attributed to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub session_id: String,
    /// Respondent identifier (stored as `participant_id`).
    #[serde(default)]
    pub user_id: Option<String>,
    pub role: Role,
    /// Logical question identifier (stored as `question_id`).
    pub task: String,
    pub content: String,
    /// `None` sorts after every known timestamp.
    #[serde(default)]
    pub timestamp: Option<jiff::Timestamp>,
}

/// One message of a reconstructed conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub task: String,
}

/// All messages of one session, grouped by task.
///
/// Built by [`crate::aggregate::aggregate_sessions`]; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub session_id: String,
    pub messages: Vec<SessionMessage>,
}

impl Conversation {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Session id of the first message, falling back to the conversation's own.
    pub fn first_session_id(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.session_id.as_str())
            .unwrap_or(&self.session_id)
    }
}

/// Order two optional timestamps with missing values last.
pub fn cmp_timestamps(a: Option<jiff::Timestamp>, b: Option<jiff::Timestamp>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse a stored event timestamp.
///
/// Accepts RFC 3339 strings, offset-less civil datetimes (read as UTC),
/// and epoch numbers. Numbers above 10^11, integer or float, are
/// milliseconds; anything smaller is seconds. `null` yields `Ok(None)`.
pub fn parse_event_timestamp(
    value: &serde_json::Value,
) -> Result<Option<jiff::Timestamp>, CoreError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => parse_timestamp_str(s).map(Some),
        serde_json::Value::Number(n) => {
            let ts = if let Some(i) = n.as_i64() {
                if i.abs() > EPOCH_MILLIS_THRESHOLD {
                    jiff::Timestamp::from_millisecond(i)
                } else {
                    jiff::Timestamp::from_second(i)
                }
            } else {
                let value = n
                    .as_f64()
                    .ok_or_else(|| CoreError::InvalidTimestamp(n.to_string()))?;
                let millis = if value.abs() > EPOCH_MILLIS_THRESHOLD as f64 {
                    value
                } else {
                    value * 1000.0
                };
                jiff::Timestamp::from_millisecond(millis.round() as i64)
            };
            ts.map(Some)
                .map_err(|e| CoreError::InvalidTimestamp(format!("{n}: {e}")))
        }
        other => Err(CoreError::InvalidTimestamp(other.to_string())),
    }
}

fn parse_timestamp_str(s: &str) -> Result<jiff::Timestamp, CoreError> {
    let s = s.trim();
    if let Ok(ts) = s.parse::<jiff::Timestamp>() {
        return Ok(ts);
    }
    let civil: jiff::civil::DateTime = s
        .parse()
        .map_err(|e| CoreError::InvalidTimestamp(format!("{s}: {e}")))?;
    civil
        .to_zoned(jiff::tz::TimeZone::UTC)
        .map(|z| z.timestamp())
        .map_err(|e| CoreError::InvalidTimestamp(format!("{s}: {e}")))
}
