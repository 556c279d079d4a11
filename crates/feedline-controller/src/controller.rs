use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use feedline_projector::{LocalityCache, NoCache, Projector};
use feedline_types::{Payload, RawMessage, Snapshot, SourceEvent, TypingState, UserId};

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::observer::{FeedObserver, Notice, run_notifier};
use crate::source::MessageSource;
use crate::worker::{Envelope, FeedState, Operation, run_worker};

/// Resolves to the snapshot projected right after the operation ran.
///
/// Dropping it does not cancel the operation.
#[must_use = "the operation runs regardless; await this to get its snapshot"]
pub struct Completion {
    rx: oneshot::Receiver<Snapshot>,
}

impl Future for Completion {
    type Output = Result<Snapshot, ControllerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|r| r.map_err(|_| ControllerError::Closed))
    }
}

pub struct ControllerBuilder {
    config: ControllerConfig,
    source: Arc<dyn MessageSource>,
    url_cache: Arc<dyn LocalityCache>,
    image_cache: Arc<dyn LocalityCache>,
}

impl ControllerBuilder {
    pub fn url_cache(mut self, cache: Arc<dyn LocalityCache>) -> Self {
        self.url_cache = cache;
        self
    }

    pub fn image_cache(mut self, cache: Arc<dyn LocalityCache>) -> Self {
        self.image_cache = cache;
        self
    }

    /// Start the worker and notifier tasks. Must be called inside a tokio
    /// runtime.
    pub fn spawn(self) -> ChatController {
        let projector = Projector::new(self.config.projection_options())
            .with_caches(self.url_cache, self.image_cache);

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (notices, notice_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_notifier(notice_rx));
        tokio::spawn(run_worker(FeedState::new(projector), command_rx, notices.clone()));

        ChatController {
            inner: Arc::new(ControllerInner {
                commands,
                notices,
                source: self.source,
                viewer: self.config.viewer_id,
                stream_delay: (self.config.stream_delay_min, self.config.stream_delay_max),
            }),
        }
    }
}

/// Cloneable handle to one feed. Every method queues work and returns
/// immediately; the work itself happens on the worker task, in call order.
#[derive(Clone)]
pub struct ChatController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    commands: mpsc::UnboundedSender<Envelope>,
    notices: mpsc::UnboundedSender<Notice>,
    source: Arc<dyn MessageSource>,
    viewer: UserId,
    stream_delay: (Duration, Duration),
}

impl ChatController {
    pub fn builder(config: ControllerConfig, source: Arc<dyn MessageSource>) -> ControllerBuilder {
        ControllerBuilder {
            config,
            source,
            url_cache: Arc::new(NoCache),
            image_cache: Arc::new(NoCache),
        }
    }

    pub fn viewer(&self) -> UserId {
        self.inner.viewer
    }

    pub(crate) fn stream_delay(&self) -> (Duration, Duration) {
        self.inner.stream_delay
    }

    /// Register the observer for all future updates, replacing any previous
    /// one. Only a weak reference is kept.
    pub fn set_observer(&self, observer: &Arc<dyn FeedObserver>) {
        let _ = self.inner.notices.send(Notice::Register(Arc::downgrade(observer)));
    }

    fn submit(&self, op: Operation) -> Completion {
        let (reply, rx) = oneshot::channel();
        if self.inner.commands.send(Envelope { op, reply: Some(reply) }).is_err() {
            warn!("Feed worker has stopped, operation dropped");
        }
        Completion { rx }
    }

    // -- History --

    pub fn load_initial(&self) -> Completion {
        self.load(false)
    }

    pub fn load_previous(&self) -> Completion {
        self.load(true)
    }

    /// The source is awaited off the worker; its result re-enters the queue
    /// as an append.
    fn load(&self, previous: bool) -> Completion {
        let (reply, rx) = oneshot::channel();
        let inner = self.inner.clone();

        tokio::spawn(async move {
            let loaded = if previous {
                inner.source.load_previous().await
            } else {
                inner.source.load_initial().await
            };
            let messages = loaded.unwrap_or_else(|e| {
                warn!(previous, "Loading messages failed: {:#}", e);
                Vec::new()
            });
            debug!(previous, count = messages.len(), "Loaded messages");

            let envelope = Envelope {
                op: Operation::Append { messages },
                reply: Some(reply),
            };
            if inner.commands.send(envelope).is_err() {
                warn!("Feed worker has stopped, loaded messages dropped");
            }
        });

        Completion { rx }
    }

    // -- Local actions --

    /// Send a message as the viewer.
    pub fn send(&self, payload: Payload) -> Completion {
        self.submit(Operation::Send { payload })
    }

    /// Open a streaming message. The id is usable right away, even before
    /// the worker has created the message.
    pub fn start_streaming(&self, initial_text: impl Into<String>, sender: UserId) -> (String, Completion) {
        let id = Uuid::new_v4().to_string();
        let completion = self.submit(Operation::StartStreaming {
            id: id.clone(),
            initial_text: initial_text.into(),
            sender,
        });
        (id, completion)
    }

    /// Replace a streaming message's text with the full content so far.
    ///
    /// An unknown id resolves to an empty section and notifies nobody.
    pub fn update_streaming(&self, id: impl Into<String>, content: impl Into<String>, is_complete: bool) -> Completion {
        self.submit(Operation::UpdateStreaming {
            id: id.into(),
            content: content.into(),
            is_complete,
        })
    }

    /// Delete a message. Observers get the result flagged for isolated
    /// processing.
    pub fn delete(&self, id: impl Into<String>) -> Completion {
        self.submit(Operation::Delete { id: id.into() })
    }

    /// Re-project without changing anything, e.g. after a cache filled in.
    pub fn reload(&self, id: impl Into<String>) -> Completion {
        self.submit(Operation::Reload { id: id.into() })
    }

    // -- Source events --

    pub fn received(&self, messages: Vec<RawMessage>) -> Completion {
        self.submit(Operation::Append { messages })
    }

    pub fn typing_state_changed(&self, state: TypingState) -> Completion {
        self.submit(Operation::SetTyping { state })
    }

    pub fn last_read_id_changed(&self, id: impl Into<String>) -> Completion {
        self.submit(Operation::LastReadIdChanged { id: id.into() })
    }

    pub fn last_received_id_changed(&self, id: impl Into<String>) -> Completion {
        self.submit(Operation::LastReceivedIdChanged { id: id.into() })
    }

    pub fn handle_source_event(&self, event: SourceEvent) -> Completion {
        match event {
            SourceEvent::Received { messages } => self.received(messages),
            SourceEvent::TypingStateChanged { state } => self.typing_state_changed(state),
            SourceEvent::LastReadIdChanged { id } => self.last_read_id_changed(id),
            SourceEvent::LastReceivedIdChanged { id } => self.last_received_id_changed(id),
        }
    }

    /// Route a stream of source events into the queue until the sender side
    /// closes.
    pub fn attach_source(&self, mut events: mpsc::UnboundedReceiver<SourceEvent>) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let _ = controller.handle_source_event(event);
            }
            debug!("Source event stream closed");
        })
    }
}
