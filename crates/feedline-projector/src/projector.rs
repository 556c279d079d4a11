use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use tracing::trace;

use feedline_types::{
    Bubble, Cell, DateGroup, Direction, ImageSource, Message, MessageContent, MessageGroup, Payload,
    RawMessage, Section, TypingState, UserId,
};

use crate::cache::{LocalityCache, NoCache};

pub const DEFAULT_SECTION_TITLE: &str = "Loading...";

/// Inputs to a projection other than the messages themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Messages from this user render as outgoing.
    pub viewer: UserId,
    /// Offset used to decide which calendar hour a message falls in.
    pub utc_offset: FixedOffset,
    pub section_title: String,
}

impl ProjectionOptions {
    pub fn new(viewer: UserId) -> Self {
        Self {
            viewer,
            utc_offset: Utc.fix(),
            section_title: DEFAULT_SECTION_TITLE.to_string(),
        }
    }
}

/// The "nothing changed" result: one titled section without cells.
pub fn empty_sections(title: &str) -> Vec<Section> {
    vec![Section {
        id: 0,
        title: title.to_string(),
        cells: Vec::new(),
    }]
}

pub struct Projector {
    options: ProjectionOptions,
    url_cache: Arc<dyn LocalityCache>,
    image_cache: Arc<dyn LocalityCache>,
}

impl Projector {
    pub fn new(options: ProjectionOptions) -> Self {
        Self {
            options,
            url_cache: Arc::new(NoCache),
            image_cache: Arc::new(NoCache),
        }
    }

    pub fn with_caches(mut self, url_cache: Arc<dyn LocalityCache>, image_cache: Arc<dyn LocalityCache>) -> Self {
        self.url_cache = url_cache;
        self.image_cache = image_cache;
        self
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    /// Build the display model. `messages` must already be in timestamp order.
    pub fn project(&self, messages: &[RawMessage], typing: TypingState) -> Vec<Section> {
        let messages: Vec<Message> = messages.iter().map(|raw| self.convert(raw)).collect();
        let runs = split_into_runs(&messages, self.options.utc_offset);

        let mut cells = Vec::with_capacity(messages.len() + runs.len() * 2 + 1);
        let mut last_sender: Option<UserId> = None;

        for (index, run) in runs.iter().enumerate() {
            let Some(first) = run.first() else {
                continue;
            };
            cells.push(Cell::Date(DateGroup {
                id: first.id.clone(),
                timestamp: first.timestamp,
            }));

            for (position, message) in run.iter().enumerate() {
                let bubble = match run.get(position + 1) {
                    Some(next) if next.sender == message.sender => Bubble::Normal,
                    _ => Bubble::Tailed,
                };

                let needs_title =
                    message.direction == Direction::Incoming && last_sender != Some(message.sender);
                if needs_title {
                    cells.push(Cell::MessageGroup(MessageGroup {
                        id: message.id.clone(),
                        sender: message.sender,
                        title: message.sender.to_string(),
                        direction: message.direction,
                    }));
                }
                last_sender = Some(message.sender);

                cells.push(Cell::Message {
                    message: message.clone(),
                    bubble,
                });
            }

            if typing == TypingState::Typing && index == runs.len() - 1 {
                cells.push(Cell::TypingIndicator);
            }
        }

        trace!(messages = messages.len(), runs = runs.len(), cells = cells.len(), "Projected feed");
        vec![Section {
            id: 0,
            title: self.options.section_title.clone(),
            cells,
        }]
    }

    fn convert(&self, raw: &RawMessage) -> Message {
        let content = match &raw.payload {
            Payload::Text(text) => MessageContent::Text(text.clone()),
            Payload::StreamingText { text, is_complete } => MessageContent::StreamingText {
                text: text.clone(),
                is_complete: *is_complete,
            },
            Payload::Url(url) => MessageContent::Url {
                url: url.clone(),
                is_locally_stored: self.url_cache.is_cached(url),
            },
            Payload::Image(source) => {
                let is_locally_stored = match source {
                    ImageSource::Embedded { .. } => true,
                    ImageSource::Url { url } => self.image_cache.is_cached(url),
                };
                MessageContent::Image {
                    source: source.clone(),
                    is_locally_stored,
                }
            }
        };

        let direction = if raw.sender == self.options.viewer {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };

        Message {
            id: raw.id.clone(),
            timestamp: raw.timestamp,
            content,
            sender: raw.sender,
            direction,
            status: raw.status,
        }
    }
}

fn hour_bucket(timestamp: DateTime<Utc>, offset: FixedOffset) -> (NaiveDate, u32) {
    let local = timestamp.with_timezone(&offset);
    (local.date_naive(), local.hour())
}

/// Split into maximal runs of consecutive messages in the same calendar hour.
fn split_into_runs(messages: &[Message], offset: FixedOffset) -> Vec<&[Message]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..messages.len() {
        if hour_bucket(messages[i - 1].timestamp, offset) != hour_bucket(messages[i].timestamp, offset) {
            runs.push(&messages[start..i]);
            start = i;
        }
    }
    if start < messages.len() {
        runs.push(&messages[start..]);
    }
    runs
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use feedline_types::MessageStatus;

    use super::*;
    use crate::cache::InMemoryCache;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    fn raw(id: &str, sender: u64, ts: DateTime<Utc>) -> RawMessage {
        RawMessage::new(id, ts, Payload::Text(id.to_uppercase()), UserId(sender))
    }

    fn projector(viewer: u64) -> Projector {
        Projector::new(ProjectionOptions::new(UserId(viewer)))
    }

    /// Compact rendering of the cell sequence for assertions.
    fn shape(sections: &[Section]) -> Vec<String> {
        assert_eq!(sections.len(), 1);
        sections[0]
            .cells
            .iter()
            .map(|cell| match cell {
                Cell::Date(group) => format!("date:{}", group.id),
                Cell::MessageGroup(group) => format!("title:{}", group.sender.0),
                Cell::Message { message, bubble } => {
                    let dir = match message.direction {
                        Direction::Incoming => "in",
                        Direction::Outgoing => "out",
                    };
                    let bubble = match bubble {
                        Bubble::Tailed => "tailed",
                        Bubble::Normal => "normal",
                    };
                    format!("{}:{dir}:{bubble}", message.id)
                }
                Cell::TypingIndicator => "typing".to_string(),
            })
            .collect()
    }

    #[test]
    fn outgoing_then_incoming_in_one_run() {
        let messages = [raw("a", 1, at(1, 10, 0)), raw("b", 2, at(1, 10, 5))];
        let sections = projector(1).project(&messages, TypingState::Idle);

        assert_eq!(sections[0].id, 0);
        assert_eq!(sections[0].title, DEFAULT_SECTION_TITLE);
        assert_eq!(shape(&sections), ["date:a", "a:out:tailed", "title:2", "b:in:tailed"]);

        let Cell::MessageGroup(group) = &sections[0].cells[2] else {
            panic!("expected a title cell");
        };
        assert_eq!(group.title, "User 2");
        assert_eq!(group.id, "b");
    }

    #[test]
    fn new_run_per_hour_and_titles_track_across_runs() {
        let messages = [
            raw("a", 2, at(1, 10, 0)),
            raw("b", 2, at(1, 10, 59)),
            raw("c", 2, at(1, 11, 0)),
            raw("d", 3, at(1, 11, 1)),
            raw("e", 1, at(1, 11, 2)),
            raw("f", 3, at(1, 11, 3)),
        ];
        let sections = projector(1).project(&messages, TypingState::Idle);

        assert_eq!(
            shape(&sections),
            [
                "date:a",
                "title:2",
                "a:in:normal",
                "b:in:tailed",
                "date:c",
                // same sender as the last rendered message, so no title
                "c:in:tailed",
                "title:3",
                "d:in:tailed",
                "e:out:tailed",
                "title:3",
                "f:in:tailed",
            ]
        );
    }

    #[test]
    fn same_hour_on_different_days_splits() {
        let messages = [raw("a", 2, at(1, 10, 0)), raw("b", 2, at(2, 10, 0))];
        let sections = projector(1).project(&messages, TypingState::Idle);
        assert_eq!(shape(&sections), ["date:a", "title:2", "a:in:tailed", "date:b", "b:in:tailed"]);
    }

    #[test]
    fn offset_moves_hour_boundaries() {
        let messages = [raw("a", 1, at(1, 10, 20)), raw("b", 1, at(1, 10, 40))];

        let mut options = ProjectionOptions::new(UserId(1));
        options.utc_offset = FixedOffset::east_opt(30 * 60).unwrap();
        let sections = Projector::new(options).project(&messages, TypingState::Idle);

        assert_eq!(shape(&sections), ["date:a", "a:out:tailed", "date:b", "b:out:tailed"]);
    }

    #[test]
    fn typing_indicator_goes_to_last_run_only() {
        let messages = [raw("a", 2, at(1, 9, 0)), raw("b", 1, at(1, 10, 0))];
        let sections = projector(1).project(&messages, TypingState::Typing);

        assert_eq!(
            shape(&sections),
            ["date:a", "title:2", "a:in:tailed", "date:b", "b:out:tailed", "typing"]
        );
    }

    #[test]
    fn empty_store_projects_one_empty_section() {
        let sections = projector(1).project(&[], TypingState::Typing);
        assert_eq!(sections, empty_sections(DEFAULT_SECTION_TITLE));
    }

    #[test]
    fn locality_resolved_through_caches() {
        let urls = Arc::new(InMemoryCache::new());
        let images = Arc::new(InMemoryCache::new());
        urls.insert("https://cached.example");
        images.insert("https://img.example/1.png");

        let messages = [
            RawMessage::new("u1", at(1, 10, 0), Payload::Url("https://cached.example".into()), UserId(2)),
            RawMessage::new("u2", at(1, 10, 1), Payload::Url("https://other.example".into()), UserId(2)),
            RawMessage::new(
                "i1",
                at(1, 10, 2),
                Payload::Image(ImageSource::Url { url: "https://img.example/1.png".into() }),
                UserId(2),
            ),
            RawMessage::new(
                "i2",
                at(1, 10, 3),
                Payload::Image(ImageSource::Embedded { name: "cat".into() }),
                UserId(2),
            ),
        ];
        let sections = projector(1)
            .with_caches(urls, images)
            .project(&messages, TypingState::Idle);

        let local: Vec<bool> = sections[0]
            .cells
            .iter()
            .filter_map(|cell| match cell {
                Cell::Message { message, .. } => match &message.content {
                    MessageContent::Url { is_locally_stored, .. }
                    | MessageContent::Image { is_locally_stored, .. } => Some(*is_locally_stored),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(local, [true, false, true, true]);
    }

    #[test]
    fn text_and_status_pass_through() {
        let mut streaming = RawMessage::new(
            "s",
            at(1, 10, 0),
            Payload::StreamingText { text: "Hel".into(), is_complete: false },
            UserId(2),
        );
        streaming.status = MessageStatus::Read;
        let sections = projector(1).project(&[streaming], TypingState::Idle);

        let Cell::Message { message, .. } = &sections[0].cells[2] else {
            panic!("expected a message cell");
        };
        assert_eq!(message.status, MessageStatus::Read);
        assert_eq!(
            message.content,
            MessageContent::StreamingText { text: "Hel".into(), is_complete: false }
        );
    }

    #[test]
    fn projection_is_deterministic() {
        let messages = [
            raw("a", 1, at(1, 10, 0)),
            raw("b", 2, at(1, 10, 5)),
            raw("c", 2, at(1, 12, 5)),
        ];
        let p = projector(1);
        let first = p.project(&messages, TypingState::Typing);
        let second = p.project(&messages, TypingState::Typing);
        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }
}
