//! Random message source for exercising the controller without a backend.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use feedline_controller::MessageSource;
use feedline_types::{ImageSource, Payload, RawMessage, SourceEvent, TypingState, UserId};

const PHRASES: &[&str] = &[
    "Morning!",
    "Did you see the build results?",
    "Lunch at noon?",
    "Pushing the fix now",
    "Can you review my branch when you get a chance",
    "Thanks, looks good to me",
    "On my way",
];

const LINKS: &[&str] = &["https://www.rust-lang.org", "https://tokio.rs", "https://docs.rs"];

const PAGE_SIZE: usize = 20;

pub struct RandomSource {
    /// Remote senders are 1..=users; the viewer is excluded.
    users: u64,
    viewer: UserId,
    /// Oldest timestamp handed out so far; previous pages go further back.
    oldest: Mutex<chrono::DateTime<Utc>>,
}

impl RandomSource {
    pub fn new(users: u64, viewer: UserId) -> Self {
        Self {
            users: users.max(1),
            viewer,
            oldest: Mutex::new(Utc::now()),
        }
    }

    fn random_sender(&self) -> UserId {
        let mut rng = rand::rng();
        // the viewer occasionally shows up so history has outgoing messages
        if rng.random_bool(0.25) {
            return self.viewer;
        }
        loop {
            let candidate = UserId(rng.random_range(1..=self.users));
            if candidate != self.viewer || self.users == 1 {
                return candidate;
            }
        }
    }

    fn random_payload() -> Payload {
        let mut rng = rand::rng();
        match rng.random_range(0..10) {
            0 => Payload::Url(LINKS.choose(&mut rng).copied().unwrap_or(LINKS[0]).to_string()),
            1 => Payload::Image(ImageSource::Url {
                url: format!("https://picsum.photos/id/{}/200", rng.random_range(1..100)),
            }),
            2 => Payload::Image(ImageSource::Embedded { name: "sticker".into() }),
            _ => Payload::Text(PHRASES.choose(&mut rng).copied().unwrap_or(PHRASES[0]).to_string()),
        }
    }

    fn random_message(&self, timestamp: chrono::DateTime<Utc>) -> RawMessage {
        RawMessage::new(Uuid::new_v4().to_string(), timestamp, Self::random_payload(), self.random_sender())
    }

    /// A page of messages ending just before the oldest one handed out.
    fn page(&self) -> anyhow::Result<Vec<RawMessage>> {
        let mut oldest = self.oldest.lock().map_err(|e| anyhow::anyhow!("source lock poisoned: {}", e))?;
        let mut messages = Vec::with_capacity(PAGE_SIZE);
        for _ in 0..PAGE_SIZE {
            let gap = TimeDelta::minutes(rand::rng().random_range(1..25));
            *oldest -= gap;
            messages.push(self.random_message(*oldest));
        }
        debug!(count = messages.len(), oldest = %*oldest, "Generated history page");
        Ok(messages)
    }

    /// Emit live events until the receiver goes away: new messages, typing
    /// toggles and receipt watermarks for the viewer's own messages.
    pub async fn pump(&self, events: mpsc::UnboundedSender<SourceEvent>) {
        info!("Random source pumping live events");
        let mut last_outgoing: Option<String> = None;

        loop {
            let (pause, roll) = {
                let mut rng = rand::rng();
                (Duration::from_millis(rng.random_range(300..1500)), rng.random_range(0..6))
            };
            tokio::time::sleep(pause).await;

            let event = match roll {
                0 => SourceEvent::TypingStateChanged { state: TypingState::Typing },
                1 => SourceEvent::TypingStateChanged { state: TypingState::Idle },
                2 | 3 => {
                    let message = self.random_message(Utc::now());
                    if message.sender == self.viewer {
                        last_outgoing = Some(message.id.clone());
                    }
                    SourceEvent::Received { messages: vec![message] }
                }
                4 => match &last_outgoing {
                    Some(id) => SourceEvent::LastReceivedIdChanged { id: id.clone() },
                    None => continue,
                },
                _ => match last_outgoing.take() {
                    Some(id) => SourceEvent::LastReadIdChanged { id },
                    None => continue,
                },
            };

            if events.send(event).is_err() {
                break;
            }
        }
        debug!("Random source stopped");
    }
}

impl MessageSource for RandomSource {
    fn load_initial(&self) -> BoxFuture<'_, anyhow::Result<Vec<RawMessage>>> {
        async move { self.page() }.boxed()
    }

    fn load_previous(&self) -> BoxFuture<'_, anyhow::Result<Vec<RawMessage>>> {
        async move { self.page() }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_go_back_in_time() {
        let source = RandomSource::new(3, UserId(0));
        let first = source.page().unwrap();
        let second = source.page().unwrap();

        assert_eq!(first.len(), PAGE_SIZE);
        let oldest_first = first.iter().map(|m| m.timestamp).min().unwrap();
        let newest_second = second.iter().map(|m| m.timestamp).max().unwrap();
        assert!(newest_second < oldest_first);
    }

    #[test]
    fn senders_stay_in_range() {
        let source = RandomSource::new(3, UserId(0));
        for _ in 0..100 {
            let sender = source.random_sender();
            assert!(sender.0 <= 3, "{sender:?}");
        }
    }
}
