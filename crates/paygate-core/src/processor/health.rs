//! Background health probe loop: one `tokio::spawn`ed cooperative loop
//! per processor client.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::ProcessorClient;

/// Spawn a task that hits `client.probe_health()` on a fixed
/// interval for the lifetime of the process.
/// The returned handle is for callers that want to `abort()` it
/// explicitly; dropping the handle does not stop the loop.
pub fn spawn_health_probe(client: Arc<dyn ProcessorClient>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick fires immediately; skip it so we don't probe
        // twice in quick succession right after client construction.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let healthy = client.probe_health().await;
            if healthy {
                debug!(processor = client.name(), "health probe: healthy");
            } else {
                warn!(processor = client.name(), "health probe: unhealthy");
            }
        }
    })
}
