use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use feedline_types::FeedUpdate;

/// Receives a fresh snapshot after every completed operation.
///
/// Called from the notifier task; implementations must not block.
pub trait FeedObserver: Send + Sync {
    fn deliver(&self, update: FeedUpdate);
}

/// Observer that forwards every update into a channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<FeedUpdate>,
}

impl ChannelObserver {
    /// Returns the observer and the receiving end of its channel. The
    /// controller only keeps a weak reference, so hold on to the `Arc`.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<FeedUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl FeedObserver for ChannelObserver {
    fn deliver(&self, update: FeedUpdate) {
        let _ = self.tx.send(update);
    }
}

/// Messages for the notifier task.
pub(crate) enum Notice {
    Register(Weak<dyn FeedObserver>),
    Update(FeedUpdate),
}

/// Notification context: owns the observer registration and hands each
/// update to it. Runs until every sender is dropped.
pub(crate) async fn run_notifier(mut rx: mpsc::UnboundedReceiver<Notice>) {
    let mut observer: Option<Weak<dyn FeedObserver>> = None;

    while let Some(notice) = rx.recv().await {
        match notice {
            Notice::Register(weak) => {
                debug!("Observer registered");
                observer = Some(weak);
            }
            Notice::Update(update) => match observer.as_ref().and_then(Weak::upgrade) {
                Some(observer) => observer.deliver(update),
                None => trace!("No live observer, update dropped"),
            },
        }
    }

    debug!("Notifier stopped");
}
