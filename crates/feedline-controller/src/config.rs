use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{FixedOffset, Offset, Utc};

use feedline_projector::{DEFAULT_SECTION_TITLE, ProjectionOptions};
use feedline_types::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// The local user; their messages render as outgoing.
    pub viewer_id: UserId,
    pub section_title: String,
    /// Offset used for hour grouping.
    pub utc_offset: FixedOffset,
    /// Bounds of the random pause between simulated streaming updates.
    pub stream_delay_min: Duration,
    pub stream_delay_max: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            viewer_id: UserId(0),
            section_title: DEFAULT_SECTION_TITLE.to_string(),
            utc_offset: Utc.fix(),
            stream_delay_min: Duration::from_millis(50),
            stream_delay_max: Duration::from_millis(200),
        }
    }
}

impl ControllerConfig {
    /// Read `FEEDLINE_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let viewer_id: u64 = get("FEEDLINE_VIEWER_ID").unwrap_or_else(|| "0".into()).parse()?;
        let section_title = get("FEEDLINE_SECTION_TITLE").unwrap_or_else(|| DEFAULT_SECTION_TITLE.into());
        let offset_minutes: i32 = get("FEEDLINE_UTC_OFFSET_MINUTES").unwrap_or_else(|| "0".into()).parse()?;
        let delay_min: u64 = get("FEEDLINE_STREAM_DELAY_MIN_MS").unwrap_or_else(|| "50".into()).parse()?;
        let delay_max: u64 = get("FEEDLINE_STREAM_DELAY_MAX_MS").unwrap_or_else(|| "200".into()).parse()?;

        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("UTC offset out of range: {} minutes", offset_minutes))?;
        if delay_min > delay_max {
            return Err(anyhow!("stream delay min {}ms exceeds max {}ms", delay_min, delay_max));
        }

        Ok(Self {
            viewer_id: UserId(viewer_id),
            section_title,
            utc_offset,
            stream_delay_min: Duration::from_millis(delay_min),
            stream_delay_max: Duration::from_millis(delay_max),
        })
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions {
            viewer: self.viewer_id,
            utc_offset: self.utc_offset,
            section_title: self.section_title.clone(),
        }
    }
}
