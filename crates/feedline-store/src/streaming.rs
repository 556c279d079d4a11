//! Streaming sessions: messages whose text grows until marked complete.
//!
//! There is no separate session table. A session is an id in
//! `MessageStore::streaming`, and the message payload is the only copy of
//! the text.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use feedline_types::{Payload, RawMessage, UserId};

use crate::{MessageStore, StoreError, StoreResult};

impl MessageStore {
    /// Open a streaming message and return its id.
    pub fn start_streaming(&mut self, initial_text: impl Into<String>, sender: UserId) -> String {
        let id = Uuid::new_v4().to_string();
        self.start_streaming_with_id(id.clone(), initial_text, sender);
        id
    }

    /// Like [`start_streaming`](Self::start_streaming) with an id chosen by
    /// the caller, so it can be handed out before the store is touched.
    pub fn start_streaming_with_id(&mut self, id: String, initial_text: impl Into<String>, sender: UserId) {
        let payload = Payload::StreamingText {
            text: initial_text.into(),
            is_complete: false,
        };
        debug!(%id, %sender, "Streaming session started");
        self.append([RawMessage::new(id, Utc::now(), payload, sender)]);
    }

    /// Replace the streamed text. `content` is the full accumulated text,
    /// never a delta.
    pub fn update_streaming(&mut self, id: &str, content: impl Into<String>, is_complete: bool) -> StoreResult<()> {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            warn!(id, "Streaming update for unknown message");
            return Err(StoreError::NotFound(id.to_string()));
        };

        message.payload = Payload::StreamingText {
            text: content.into(),
            is_complete,
        };

        if is_complete {
            self.streaming.remove(id);
            debug!(id, "Streaming session completed");
        } else {
            self.streaming.insert(id.to_string());
        }
        Ok(())
    }

    pub fn is_streaming(&self, id: &str) -> bool {
        self.streaming.contains(id)
    }

    /// Ids of messages still being streamed, in no particular order.
    pub fn active_sessions(&self) -> impl Iterator<Item = &str> {
        self.streaming.iter().map(String::as_str)
    }
}
