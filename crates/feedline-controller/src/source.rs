use futures_util::future::{BoxFuture, FutureExt};

use feedline_types::RawMessage;

/// Where history comes from. Push-style updates arrive separately as
/// [`SourceEvent`](feedline_types::SourceEvent)s, see
/// [`ChatController::attach_source`](crate::ChatController::attach_source).
pub trait MessageSource: Send + Sync {
    fn load_initial(&self) -> BoxFuture<'_, anyhow::Result<Vec<RawMessage>>>;

    fn load_previous(&self) -> BoxFuture<'_, anyhow::Result<Vec<RawMessage>>>;
}

/// Source with no history at all.
pub struct EmptySource;

impl MessageSource for EmptySource {
    fn load_initial(&self) -> BoxFuture<'_, anyhow::Result<Vec<RawMessage>>> {
        async { Ok(Vec::new()) }.boxed()
    }

    fn load_previous(&self) -> BoxFuture<'_, anyhow::Result<Vec<RawMessage>>> {
        async { Ok(Vec::new()) }.boxed()
    }
}
