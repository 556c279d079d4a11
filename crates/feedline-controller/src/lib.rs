//! Single-writer controller for a chat feed.
//!
//! All mutations run on one worker task in submission order; projections are
//! handed to a separate notifier task that calls the registered observer.

pub mod config;
pub mod controller;
pub mod error;
pub mod observer;
pub mod simulate;
pub mod source;
mod worker;

pub use config::ControllerConfig;
pub use controller::{ChatController, Completion, ControllerBuilder};
pub use error::ControllerError;
pub use observer::{ChannelObserver, FeedObserver};
pub use source::{EmptySource, MessageSource};
