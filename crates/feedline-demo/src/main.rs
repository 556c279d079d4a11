use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use feedline_controller::{ChatController, ControllerConfig, FeedObserver};
use feedline_projector::InMemoryCache;
use feedline_types::{Cell, FeedUpdate, MessageContent, Payload, UserId};

mod random_source;

use random_source::RandomSource;

/// Logs a summary of every snapshot it receives.
struct LogObserver;

impl FeedObserver for LogObserver {
    fn deliver(&self, update: FeedUpdate) {
        let cells: usize = update.sections.iter().map(|s| s.cells.len()).sum();
        let typing = update
            .sections
            .iter()
            .any(|s| s.cells.contains(&Cell::TypingIndicator));
        let last = update
            .sections
            .iter()
            .flat_map(|s| s.cells.last())
            .last()
            .map(Cell::diff_id)
            .unwrap_or_default();
        info!(cells, typing, last = %last, isolated = update.requires_isolated_processing, "Feed updated");

        match serde_json::to_string(&*update.sections) {
            Ok(json) => trace!("{}", json),
            Err(e) => warn!("Failed to serialize snapshot: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedline=debug".into()),
        )
        .init();

    // Config
    let config = ControllerConfig::from_env()?;
    let run_for: u64 = std::env::var("FEEDLINE_DEMO_SECS")
        .unwrap_or_else(|_| "10".into())
        .parse()?;
    let users: u64 = std::env::var("FEEDLINE_DEMO_USERS")
        .unwrap_or_else(|_| "3".into())
        .parse()?;
    let viewer = config.viewer_id;

    // Shared state
    let source = Arc::new(RandomSource::new(users, viewer));
    let url_cache = Arc::new(InMemoryCache::new());
    let image_cache = Arc::new(InMemoryCache::new());

    let controller = ChatController::builder(config, source.clone())
        .url_cache(url_cache.clone())
        .image_cache(image_cache)
        .spawn();

    let observer: Arc<dyn FeedObserver> = Arc::new(LogObserver);
    controller.set_observer(&observer);

    let initial = controller.load_initial().await?;
    info!(viewer = %controller.viewer(), cells = initial[0].cells.len(), "Initial history loaded");

    // Fill the URL cache for everything already on screen, then reload.
    for section in initial.iter() {
        for cell in &section.cells {
            if let Cell::Message { message, .. } = cell {
                if let MessageContent::Url { url, .. } = &message.content {
                    url_cache.insert(url.clone());
                    let _ = controller.reload(message.id.clone());
                }
            }
        }
    }

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let forwarder = controller.attach_source(events_rx);
    let pump = {
        let source = source.clone();
        tokio::spawn(async move { source.pump(events_tx).await })
    };

    let driver = {
        let controller = controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let sent = controller.send(Payload::Text("Hello from the demo".into())).await;
            if let Ok(sections) = sent {
                let last_id = sections[0].cells.iter().rev().find_map(|cell| match cell {
                    Cell::Message { message, .. } => Some(message.id.clone()),
                    _ => None,
                });
                if let Some(id) = last_id {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    let _ = controller.delete(id);
                }
            }

            let (id, stream) = controller.simulate_streaming(
                "Streaming replies arrive one word at a time until the stream completes",
                UserId(1),
            );
            info!(%id, "Simulating streaming message");
            let _ = stream.await;

            let _ = controller.load_previous().await;
        })
    };

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(run_for)) => {
            info!("Demo finished after {}s", run_for);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    pump.abort();
    driver.abort();
    forwarder.abort();
    Ok(())
}
