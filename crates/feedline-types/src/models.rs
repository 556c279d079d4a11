use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque sender identity. The feed never resolves profiles; the display
/// form doubles as the sender title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User {}", self.0)
    }
}

/// Delivery progression. Ordered so that `Read > Received > Sent`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Sent,
    Received,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Bundled with the message itself, always available locally.
    Embedded { name: String },
    /// Remote image that may or may not be in the image cache.
    Url { url: String },
}

/// Message body as received from a source or produced locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    StreamingText { text: String, is_complete: bool },
    Url(String),
    Image(ImageSource),
}

impl Payload {
    pub fn is_incomplete_stream(&self) -> bool {
        matches!(self, Self::StreamingText { is_complete: false, .. })
    }
}

/// A message as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Payload,
    pub sender: UserId,
    #[serde(default)]
    pub status: MessageStatus,
}

impl RawMessage {
    /// New message with status `Sent`.
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, payload: Payload, sender: UserId) -> Self {
        Self {
            id: id.into(),
            timestamp,
            payload,
            sender,
            status: MessageStatus::Sent,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingState {
    #[default]
    Idle,
    Typing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_orders_by_progression() {
        assert!(MessageStatus::Sent < MessageStatus::Received);
        assert!(MessageStatus::Received < MessageStatus::Read);
        assert_eq!(MessageStatus::default(), MessageStatus::Sent);
    }

    #[test]
    fn user_id_displays_as_title() {
        assert_eq!(UserId(7).to_string(), "User 7");
    }

    #[test]
    fn missing_status_deserializes_as_sent() {
        let json = r#"{
            "id": "m1",
            "timestamp": "2024-05-01T10:00:00Z",
            "payload": { "type": "text", "data": "hi" },
            "sender": 3
        }"#;
        let msg: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.status, MessageStatus::Sent);
        assert_eq!(msg.payload, Payload::Text("hi".into()));
        assert_eq!(msg.sender, UserId(3));
    }

    #[test]
    fn only_unfinished_streams_are_incomplete() {
        let open = Payload::StreamingText { text: "a".into(), is_complete: false };
        let done = Payload::StreamingText { text: "a b".into(), is_complete: true };
        assert!(open.is_incomplete_stream());
        assert!(!done.is_incomplete_stream());
        assert!(!Payload::Text("x".into()).is_incomplete_stream());
    }
}
