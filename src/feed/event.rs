use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::subscription::Topic;
use crate::utils::error::StreamDecodeError;

/// A message received on the live stream.
///
/// Events are produced by the active feed connection and are immutable once
/// decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    pub topic: Topic,
    pub message_id: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

/// What the backend pushes for each stream message:
/// `{ "topic_name": "...", "message": { "id": .., "data": .., "created": .. } }`
#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(default)]
    topic_name: Option<String>,
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    created: Option<Value>,
}

impl FeedEvent {
    /// Builds an event directly, without going through the wire format.
    pub fn new(
        topic: impl Into<Topic>,
        message_id: impl Into<String>,
        payload: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            topic: topic.into(),
            message_id: message_id.into(),
            payload: payload.into(),
            created_at,
        }
    }

    /// Decodes one stream payload.
    ///
    /// Message ids may be numbers or strings. Non-string data is kept as
    /// compact JSON. `created` is RFC 3339 text or epoch milliseconds.
    pub fn decode(raw: &str) -> Result<Self, StreamDecodeError> {
        let wire: WireEvent = serde_json::from_str(raw)?;

        let topic = wire
            .topic_name
            .filter(|t| !t.is_empty())
            .ok_or(StreamDecodeError::MissingField("topic_name"))?;
        let message_id = match wire.message.id {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(StreamDecodeError::MissingField("message.id")),
        };
        let payload = match wire.message.data {
            Some(Value::String(data)) => data,
            Some(Value::Null) | None => {
                return Err(StreamDecodeError::MissingField("message.data"));
            }
            Some(other) => other.to_string(),
        };
        let created = wire
            .message
            .created
            .ok_or(StreamDecodeError::MissingField("message.created"))?;

        Ok(Self {
            topic,
            message_id,
            payload,
            created_at: parse_created(&created)?,
        })
    }
}

fn parse_created(value: &Value) -> Result<DateTime<Utc>, StreamDecodeError> {
    let bad = || StreamDecodeError::BadTimestamp(value.to_string());

    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(bad),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(millis) = s.parse::<i64>() {
                return DateTime::from_timestamp_millis(millis).ok_or_else(bad);
            }
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| bad())
        }
        _ => Err(bad()),
    }
}

impl fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] #{} {} (created {})",
            self.topic,
            self.message_id,
            self.payload,
            self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}
