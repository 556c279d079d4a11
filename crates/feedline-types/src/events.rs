use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{RawMessage, TypingState};
use crate::view::Section;

/// Immutable projection result shared between the worker and observers.
pub type Snapshot = Arc<[Section]>;

/// Events pushed by a message source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SourceEvent {
    /// New messages arrived from remote senders
    Received { messages: Vec<RawMessage> },

    /// The remote side started or stopped typing
    TypingStateChanged { state: TypingState },

    /// Everything up to and including `id` has been read
    LastReadIdChanged { id: String },

    /// Everything up to and including `id` has been received
    LastReceivedIdChanged { id: String },
}

/// What an observer receives after each completed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub sections: Snapshot,
    /// Hint that the consumer should apply this update on its own rather
    /// than batching or animating it together with neighbours.
    pub requires_isolated_processing: bool,
}
