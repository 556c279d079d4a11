//! Watermark-driven status propagation.
//!
//! A watermark means "everything up to and including this id". Propagation
//! upgrades the prefix of the store that ends at the watermark, so repeating
//! a watermark is a no-op and later messages are never touched.

use tracing::{debug, trace};

use feedline_types::MessageStatus;

use crate::MessageStore;

impl MessageStore {
    /// Upgrade every message up to and including `watermark` to at least
    /// `target`. Returns how many messages changed.
    ///
    /// An unknown watermark changes nothing.
    pub fn advance_status(&mut self, watermark: &str, target: MessageStatus) -> usize {
        let Some(end) = self.position(watermark) else {
            trace!(watermark, ?target, "Watermark not in store");
            return 0;
        };

        let mut upgraded = 0;
        for message in &mut self.messages[..=end] {
            if message.status < target {
                message.status = target;
                upgraded += 1;
            }
        }

        debug!(watermark, ?target, upgraded, "Advanced status");
        upgraded
    }

    pub fn mark_received(&mut self, watermark: &str) -> usize {
        self.advance_status(watermark, MessageStatus::Received)
    }

    pub fn mark_read(&mut self, watermark: &str) -> usize {
        self.advance_status(watermark, MessageStatus::Read)
    }
}

#[cfg(test)]
mod tests {
    use feedline_types::MessageStatus::{Read, Received, Sent};

    use crate::MessageStore;
    use crate::test_support::text;

    fn statuses(store: &MessageStore) -> Vec<feedline_types::MessageStatus> {
        store.messages().iter().map(|m| m.status).collect()
    }

    fn abc() -> MessageStore {
        let mut store = MessageStore::new();
        store.append([text("a", 1, 10, 0), text("b", 2, 10, 5), text("c", 1, 10, 10)]);
        store
    }

    #[test]
    fn received_watermark_upgrades_prefix_only() {
        let mut store = abc();
        assert_eq!(store.mark_received("b"), 2);
        assert_eq!(statuses(&store), [Received, Received, Sent]);
    }

    #[test]
    fn same_watermark_twice_is_idempotent() {
        let mut once = abc();
        once.mark_received("b");

        let mut twice = abc();
        twice.mark_received("b");
        assert_eq!(twice.mark_received("b"), 0);

        assert_eq!(once.messages(), twice.messages());
    }

    #[test]
    fn unknown_watermark_changes_nothing() {
        let mut store = abc();
        assert_eq!(store.mark_read("missing"), 0);
        assert_eq!(statuses(&store), [Sent, Sent, Sent]);
    }

    #[test]
    fn status_never_regresses() {
        let mut store = abc();
        store.mark_read("b");
        store.mark_received("c");
        assert_eq!(statuses(&store), [Read, Read, Received]);

        store.mark_received("a");
        assert_eq!(statuses(&store), [Read, Read, Received]);
    }

    #[test]
    fn read_scan_does_not_need_prior_receipt() {
        let mut store = abc();
        assert_eq!(store.mark_read("a"), 1);
        assert_eq!(statuses(&store), [Read, Sent, Sent]);
    }

    #[test]
    fn late_history_before_watermark_is_upgraded_on_reapply() {
        let mut store = abc();
        store.mark_received("b");

        store.append([text("early", 2, 9, 0)]);
        assert_eq!(store.messages()[0].status, Sent);

        assert_eq!(store.mark_received("b"), 1);
        assert_eq!(statuses(&store), [Received, Received, Received, Sent]);
    }
}
