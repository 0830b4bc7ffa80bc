//! Route-level refresh notifications.
//!
//! Server-rendered routes keep their own caches of the initial page data.
//! After a mutation settles they are told to drop them.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::debug;

/// Receiver side of route refreshes.
pub trait RouteRefresher: Send + Sync {
    fn refresh(&self);
}

/// Event published on every route refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRefresh {
    /// Monotonic count of refreshes issued by this notifier
    pub generation: u64,
}

/// Publishes refreshes on a broadcast channel.
#[derive(Debug)]
pub struct BroadcastRefresher {
    sender: broadcast::Sender<RouteRefresh>,
    generation: AtomicU64,
}

impl BroadcastRefresher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouteRefresh> {
        self.sender.subscribe()
    }

    /// Number of refreshes issued so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastRefresher {
    fn default() -> Self {
        Self::new(16)
    }
}

impl RouteRefresher for BroadcastRefresher {
    fn refresh(&self) {
        let generation = self
            .generation
            .fetch_add(1, Ordering::Relaxed)
            + 1;
        // No subscribers is fine: nothing to refresh.
        let receivers = self.sender.send(RouteRefresh { generation }).unwrap_or(0);
        debug!(generation, receivers, "route refresh issued");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_refresh() {
        let refresher = BroadcastRefresher::default();
        let mut rx = refresher.subscribe();

        refresher.refresh();
        refresher.refresh();

        assert_eq!(rx.recv().await.unwrap(), RouteRefresh { generation: 1 });
        assert_eq!(rx.recv().await.unwrap(), RouteRefresh { generation: 2 });
        assert_eq!(refresher.generation(), 2);
    }

    #[test]
    fn test_refresh_wakes_waiting_subscriber() {
        let refresher = BroadcastRefresher::default();
        let mut rx = refresher.subscribe();
        let mut recv = tokio_test::task::spawn(rx.recv());

        tokio_test::assert_pending!(recv.poll());

        refresher.refresh();
        assert!(recv.is_woken());
        let event = tokio_test::assert_ready_ok!(recv.poll());
        assert_eq!(event.generation, 1);
    }

    #[test]
    fn test_refresh_without_subscribers() {
        let refresher = BroadcastRefresher::new(1);
        refresher.refresh();
        assert_eq!(refresher.generation(), 1);
    }
}
