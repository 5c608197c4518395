//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Local market-data fan-out built on tokio's broadcast channel. Snapshots and
// trade copies go only to in-process subscribers; the bus never sees them.
//
// | Name          | Description                                   | Key Methods        |
// |---------------|-----------------------------------------------|--------------------|
// | MarketFeed    | Broadcast fan-out for feed messages           | publish, subscribe |
//--------------------------------------------------------------------------------------------------

use tokio::sync::broadcast;
use tracing::{debug, error};

use super::types::FeedMessage;

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out channel delivering [`FeedMessage`]s to all local subscribers.
///
/// Publishing with no subscribers is a no-op; slow subscribers that fall more
/// than the channel capacity behind miss messages, which is acceptable for a
/// feed whose snapshots supersede one another.
#[derive(Debug, Clone)]
pub struct MarketFeed {
    sender: broadcast::Sender<FeedMessage>,
    capacity: usize,
}

impl Default for MarketFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MarketFeed {
    /// Creates a feed whose per-subscriber backlog holds up to `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Delivers a message to every current subscriber.
    pub fn publish(&self, message: FeedMessage) {
        if self.sender.receiver_count() == 0 {
            debug!("no feed subscribers, dropping message");
            return;
        }
        if let Err(err) = self.sender.send(message) {
            error!("failed to publish feed message: {}", err);
        }
    }

    /// Creates a new independent subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedMessage> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// The configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::DepthSnapshot;

    fn empty_snapshot() -> FeedMessage {
        FeedMessage::Snapshot(DepthSnapshot {
            bids: vec![],
            asks: vec![],
        })
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let feed = MarketFeed::default();
        assert_eq!(feed.subscriber_count(), 0);
        feed.publish(empty_snapshot());
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let feed = MarketFeed::new(16);
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        feed.publish(empty_snapshot());
        assert_eq!(first.recv().await.unwrap(), empty_snapshot());
        assert_eq!(second.recv().await.unwrap(), empty_snapshot());
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let feed = MarketFeed::new(16);
        let mut rx = feed.subscribe();

        feed.publish(FeedMessage::Trade(vec![]));
        feed.publish(empty_snapshot());

        assert!(matches!(rx.recv().await.unwrap(), FeedMessage::Trade(_)));
        assert!(matches!(rx.recv().await.unwrap(), FeedMessage::Snapshot(_)));
    }
}
