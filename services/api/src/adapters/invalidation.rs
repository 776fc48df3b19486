//! services/api/src/adapters/invalidation.rs

use studio_core::ports::CacheInvalidator;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 256;

/// Publishes invalidated paths to whoever renders them.
#[derive(Clone)]
pub struct BroadcastInvalidator {
    tx: broadcast::Sender<String>,
}

impl BroadcastInvalidator {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastInvalidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheInvalidator for BroadcastInvalidator {
    fn revalidate(&self, path: &str) {
        debug!(path, "Revalidating");
        // No subscribers is fine.
        let _ = self.tx.send(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_paths() {
        let invalidator = BroadcastInvalidator::new();
        let mut rx = invalidator.subscribe();
        invalidator.revalidate("/admin/bookings");
        assert_eq!(rx.recv().await.unwrap(), "/admin/bookings");
    }

    #[test]
    fn revalidate_without_subscribers_does_not_panic() {
        BroadcastInvalidator::new().revalidate("/");
    }
}
