pub mod events;
pub mod models;
pub mod view;

pub use events::{FeedUpdate, Snapshot, SourceEvent};
pub use models::{ImageSource, MessageStatus, Payload, RawMessage, TypingState, UserId};
pub use view::{Bubble, Cell, DateGroup, Direction, Message, MessageContent, MessageGroup, Section};
