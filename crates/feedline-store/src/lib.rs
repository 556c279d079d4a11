pub mod error;
pub mod status;
pub mod streaming;

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, trace};
use uuid::Uuid;

use feedline_types::{Payload, RawMessage, UserId};

pub use error::{StoreError, StoreResult};

/// Ordered, mutable collection of raw messages.
///
/// Messages are kept sorted by timestamp, ties in insertion order. The store
/// is also the single owner of streaming state: `streaming` is just the set of
/// ids whose payload is still an incomplete stream.
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    messages: Vec<RawMessage>,
    streaming: HashSet<String>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `messages` and restore timestamp order.
    ///
    /// Ids are not checked for uniqueness; callers must not hand in ids the
    /// store already holds.
    pub fn append(&mut self, messages: impl IntoIterator<Item = RawMessage>) {
        let before = self.messages.len();
        for message in messages {
            if message.payload.is_incomplete_stream() {
                self.streaming.insert(message.id.clone());
            }
            self.messages.push(message);
        }
        // stable: equal timestamps keep insertion order
        self.messages.sort_by_key(|m| m.timestamp);
        debug!(added = self.messages.len() - before, total = self.messages.len(), "Appended messages");
    }

    /// Store a locally authored message and return its new id.
    pub fn send(&mut self, payload: Payload, sender: UserId) -> String {
        let id = Uuid::new_v4().to_string();
        self.append([RawMessage::new(id.clone(), Utc::now(), payload, sender)]);
        id
    }

    /// Returns true if a message was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            trace!(id, "Remove ignored, no such message");
            return false;
        };
        self.messages.remove(index);
        self.streaming.remove(id);
        debug!(id, total = self.messages.len(), "Removed message");
        true
    }

    pub fn find(&self, id: &str) -> Option<&RawMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[RawMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }
}
