//! Display model derived from the store on every projection.
//!
//! Nothing here is mutated in place; a new tree is built each time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ImageSource, MessageStatus, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bubble {
    /// Visually terminal: last in its run, or the next message has another sender.
    Tailed,
    /// Continues into the next message from the same sender.
    Normal,
}

/// Payload with cache locality resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    StreamingText { text: String, is_complete: bool },
    Url { url: String, is_locally_stored: bool },
    Image { source: ImageSource, is_locally_stored: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub content: MessageContent,
    pub sender: UserId,
    pub direction: Direction,
    pub status: MessageStatus,
}

/// Marker opening a run of messages that share a date and hour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateGroup {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// Sender title shown above a block of incoming messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageGroup {
    pub id: String,
    pub sender: UserId,
    pub title: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Cell {
    Date(DateGroup),
    MessageGroup(MessageGroup),
    Message { message: Message, bubble: Bubble },
    TypingIndicator,
}

impl Cell {
    /// Stable identity for diffing consumers. Date and title markers reuse the
    /// id of the message they introduce, so they carry a prefix.
    pub fn diff_id(&self) -> String {
        match self {
            Self::Date(group) => format!("date:{}", group.id),
            Self::MessageGroup(group) => format!("group:{}", group.id),
            Self::Message { message, .. } => message.id.clone(),
            Self::TypingIndicator => "typing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Section {
    pub id: u32,
    pub title: String,
    pub cells: Vec<Cell>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_ids_do_not_collide_with_message_ids() {
        let ts = DateTime::<Utc>::UNIX_EPOCH;
        let date = Cell::Date(DateGroup { id: "a".into(), timestamp: ts });
        let group = Cell::MessageGroup(MessageGroup {
            id: "a".into(),
            sender: UserId(2),
            title: "User 2".into(),
            direction: Direction::Incoming,
        });
        let message = Cell::Message {
            message: Message {
                id: "a".into(),
                timestamp: ts,
                content: MessageContent::Text("hi".into()),
                sender: UserId(2),
                direction: Direction::Incoming,
                status: MessageStatus::Sent,
            },
            bubble: Bubble::Tailed,
        };

        let ids = [date.diff_id(), group.diff_id(), message.diff_id(), Cell::TypingIndicator.diff_id()];
        assert_eq!(ids, ["date:a", "group:a", "a", "typing"]);
    }

    #[test]
    fn cells_serialize_with_type_tag() {
        let json = serde_json::to_value(Cell::TypingIndicator).unwrap();
        assert_eq!(json["type"], "typing_indicator");
    }
}
