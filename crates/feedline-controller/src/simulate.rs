//! Drives a streaming message word by word, the way a token stream would.

use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::debug;

use feedline_types::UserId;

use crate::controller::ChatController;

impl ChatController {
    /// Stream `final_text` into a new message one word at a time, pausing a
    /// random configured delay between updates, then mark it complete.
    ///
    /// Aborting the returned handle stops further updates; the message stays
    /// incomplete.
    pub fn simulate_streaming(&self, final_text: &str, sender: UserId) -> (String, JoinHandle<()>) {
        let words: Vec<String> = final_text
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();
        let (id, _started) = self.start_streaming("", sender);

        let controller = self.clone();
        let stream_id = id.clone();
        let handle = tokio::spawn(async move {
            let (min, max) = controller.stream_delay();
            let mut current = String::new();

            for (index, word) in words.iter().enumerate() {
                if index > 0 {
                    current.push(' ');
                }
                current.push_str(word);
                let _ = controller.update_streaming(stream_id.as_str(), current.as_str(), false);
                tokio::time::sleep(jitter(min, max)).await;
            }

            let _ = controller.update_streaming(stream_id.as_str(), current, true);
            debug!(id = %stream_id, words = words.len(), "Simulated stream finished");
        });

        (id, handle)
    }
}

fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let low = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
    let high = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rand::rng().random_range(low..=high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_in_bounds() {
        let min = Duration::from_millis(50);
        let max = Duration::from_millis(200);
        for _ in 0..200 {
            let delay = jitter(min, max);
            assert!(delay >= min && delay <= max, "{delay:?}");
        }
        assert_eq!(jitter(max, min), max);
    }
}
