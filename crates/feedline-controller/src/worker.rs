//! Serialization context. The worker task owns every piece of mutable feed
//! state and applies operations strictly in the order they were queued.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use feedline_projector::{Projector, empty_sections};
use feedline_store::{MessageStore, StoreResult};
use feedline_types::{FeedUpdate, Payload, RawMessage, Snapshot, TypingState, UserId};

use crate::observer::Notice;

#[derive(Debug)]
pub(crate) enum Operation {
    /// Loaded history or pushed messages; watermarks are re-applied after.
    Append { messages: Vec<RawMessage> },
    Send { payload: Payload },
    StartStreaming { id: String, initial_text: String, sender: UserId },
    UpdateStreaming { id: String, content: String, is_complete: bool },
    Delete { id: String },
    SetTyping { state: TypingState },
    LastReadIdChanged { id: String },
    LastReceivedIdChanged { id: String },
    Reload { id: String },
}

pub(crate) struct Envelope {
    pub op: Operation,
    pub reply: Option<oneshot::Sender<Snapshot>>,
}

/// How the result of an applied operation should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Delivery {
    pub isolated: bool,
}

pub(crate) struct FeedState {
    store: MessageStore,
    typing: TypingState,
    viewer: UserId,
    last_read: Option<String>,
    last_received: Option<String>,
    projector: Projector,
}

impl FeedState {
    pub fn new(projector: Projector) -> Self {
        let viewer = projector.options().viewer;
        Self {
            store: MessageStore::new(),
            typing: TypingState::Idle,
            viewer,
            last_read: None,
            last_received: None,
            projector,
        }
    }

    pub fn apply(&mut self, op: Operation) -> StoreResult<Delivery> {
        let mut isolated = false;

        match op {
            Operation::Append { messages } => {
                self.store.append(messages);
                self.reapply_watermarks();
            }
            Operation::Send { payload } => {
                let id = self.store.send(payload, self.viewer);
                debug!(%id, "Message sent");
            }
            Operation::StartStreaming { id, initial_text, sender } => {
                self.store.start_streaming_with_id(id, initial_text, sender);
            }
            Operation::UpdateStreaming { id, content, is_complete } => {
                self.store.update_streaming(&id, content, is_complete)?;
            }
            Operation::Delete { id } => {
                self.store.remove(&id);
                isolated = true;
            }
            Operation::SetTyping { state } => {
                self.typing = state;
            }
            Operation::LastReadIdChanged { id } => {
                self.store.mark_read(&id);
                self.last_read = Some(id);
            }
            Operation::LastReceivedIdChanged { id } => {
                self.store.mark_received(&id);
                self.last_received = Some(id);
            }
            Operation::Reload { id } => {
                debug!(%id, "Reloading feed for message");
            }
        }

        Ok(Delivery { isolated })
    }

    fn reapply_watermarks(&mut self) {
        if let Some(id) = &self.last_received {
            self.store.mark_received(id);
        }
        if let Some(id) = &self.last_read {
            self.store.mark_read(id);
        }
    }

    pub fn project(&self) -> Snapshot {
        self.projector.project(self.store.messages(), self.typing).into()
    }

    pub fn unchanged(&self) -> Snapshot {
        empty_sections(&self.projector.options().section_title).into()
    }

    #[cfg(test)]
    pub fn store(&self) -> &MessageStore {
        &self.store
    }
}

pub(crate) async fn run_worker(
    mut state: FeedState,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    notices: mpsc::UnboundedSender<Notice>,
) {
    info!(viewer = %state.viewer, "Feed worker started");

    while let Some(Envelope { op, reply }) = rx.recv().await {
        match state.apply(op) {
            Ok(Delivery { isolated }) => {
                let sections = state.project();
                if let Some(reply) = reply {
                    let _ = reply.send(sections.clone());
                }
                let _ = notices.send(Notice::Update(FeedUpdate {
                    sections,
                    requires_isolated_processing: isolated,
                }));
            }
            Err(e) => {
                // soft failure: the caller sees "no change", observers see nothing
                warn!("Operation left feed unchanged: {}", e);
                if let Some(reply) = reply {
                    let _ = reply.send(state.unchanged());
                }
            }
        }
    }

    info!("Feed worker stopped");
}
