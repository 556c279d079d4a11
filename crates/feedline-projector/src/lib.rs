//! Derives the display model (sections and cells) from raw messages.

pub mod cache;
pub mod projector;

pub use cache::{InMemoryCache, LocalityCache, NoCache};
pub use projector::{DEFAULT_SECTION_TITLE, ProjectionOptions, Projector, empty_sections};
