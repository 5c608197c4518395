//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The event dispatcher: deserializes inbound bus payloads, serializes all book
// mutations through the process lock, and publishes the results. Trade bursts
// and acks go to the bus; snapshots (plus trade copies) go to the local feed.
//
// | Name               | Description                                      | Key Methods          |
// |--------------------|--------------------------------------------------|----------------------|
// | OutboundPublisher  | Seam for the bus publisher                       | publish              |
// | EngineDispatcher   | Routes place/cancel/modify through the engine    | handle_raw, snapshot |
//--------------------------------------------------------------------------------------------------

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rabbit_bus::BusError;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::fanout::MarketFeed;
use super::types::{AckMessage, FeedMessage, InboundEvent, OrderAck, TradeBurst, TradeExecution};
use crate::depth::{DEFAULT_DEPTH, DepthSnapshot};
use crate::matching_engine::MatchingEngine;
use crate::types::{Order, Side, normalize_price};

/// Publishes serialized messages to the outbound bus stream.
///
/// Publish failures are logged and swallowed by the dispatcher: trades are
/// authoritative in-engine and downstream reconciles.
#[async_trait]
pub trait OutboundPublisher: Send + Sync {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), BusError>;
}

#[async_trait]
impl OutboundPublisher for rabbit_bus::Publisher {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), BusError> {
        rabbit_bus::Publisher::publish(self, payload).await
    }
}

/// Serializes inbound events through the process lock and fans out the results.
///
/// The lock is held only across the synchronous book mutation and the snapshot
/// capture; matching never suspends, and no publish happens under the lock.
#[derive(Clone)]
pub struct EngineDispatcher {
    engine: Arc<Mutex<MatchingEngine>>,
    publisher: Arc<dyn OutboundPublisher>,
    feed: MarketFeed,
}

impl EngineDispatcher {
    /// Creates a dispatcher owning a fresh engine.
    pub fn new(publisher: Arc<dyn OutboundPublisher>, feed: MarketFeed) -> Self {
        Self {
            engine: Arc::new(Mutex::new(MatchingEngine::new())),
            publisher,
            feed,
        }
    }

    /// Parses and processes one raw bus payload. Malformed payloads are
    /// logged and dropped without acknowledgement or state change.
    pub async fn handle_raw(&self, raw: &[u8]) {
        let event = match serde_json::from_slice::<InboundEvent>(raw) {
            Ok(event) => event,
            Err(err) => {
                error!("dropping malformed event: {}", err);
                return;
            }
        };
        self.handle_event(event).await;
    }

    /// Processes one parsed inbound event.
    pub async fn handle_event(&self, event: InboundEvent) {
        debug!(?event, "processing inbound event");
        match event {
            InboundEvent::Place {
                order_id,
                side,
                price,
                quantity,
            } => self.handle_place(order_id, side, price, quantity).await,
            InboundEvent::Cancel { order_id } => self.handle_cancel(order_id).await,
            InboundEvent::Modify { order_id, price } => self.handle_modify(order_id, price).await,
            InboundEvent::Unknown => error!("dropping event with unknown action"),
        }
    }

    async fn handle_place(
        &self,
        order_id: Option<Uuid>,
        side: Side,
        price: Decimal,
        quantity: u64,
    ) {
        let price = normalize_price(price);
        if price <= Decimal::ZERO {
            error!(%price, "dropping place with non-positive price");
            return;
        }
        if quantity == 0 {
            error!("dropping place with zero quantity");
            return;
        }

        let id = order_id.unwrap_or_else(Uuid::new_v4);
        let incoming = Order::new(id, side, price, quantity);

        let (trades, snapshot) = {
            let mut engine = self.engine.lock();
            let trades = engine.submit(incoming);
            (trades, engine.depth(DEFAULT_DEPTH))
        };

        if !trades.is_empty() {
            info!(order_id = %id, count = trades.len(), "order produced trades");
            let executions: Vec<TradeExecution> =
                trades.iter().map(TradeExecution::from).collect();
            self.publish(&TradeBurst {
                trades: executions.clone(),
            })
            .await;
            self.feed.publish(FeedMessage::Trade(executions));
        }
        self.feed.publish(FeedMessage::Snapshot(snapshot));
    }

    async fn handle_cancel(&self, order_id: Uuid) {
        let (success, snapshot) = {
            let mut engine = self.engine.lock();
            let success = engine.cancel(&order_id);
            (success, engine.depth(DEFAULT_DEPTH))
        };
        if !success {
            debug!(%order_id, "cancel for unknown order id");
        }

        self.publish(&AckMessage::Cancel(OrderAck { order_id, success }))
            .await;
        self.feed.publish(FeedMessage::Snapshot(snapshot));
    }

    async fn handle_modify(&self, order_id: Uuid, price: Decimal) {
        let price = normalize_price(price);
        if price <= Decimal::ZERO {
            error!(%price, "dropping modify with non-positive price");
            return;
        }

        let (success, snapshot) = {
            let mut engine = self.engine.lock();
            let success = engine.modify(&order_id, price);
            (success, engine.depth(DEFAULT_DEPTH))
        };
        if !success {
            debug!(%order_id, "modify for unknown order id");
        }

        self.publish(&AckMessage::Modify(OrderAck { order_id, success }))
            .await;
        self.feed.publish(FeedMessage::Snapshot(snapshot));
    }

    /// Captures a current depth snapshot under the process lock.
    pub fn snapshot(&self) -> DepthSnapshot {
        self.engine.lock().depth(DEFAULT_DEPTH)
    }

    /// Pushes a fresh snapshot to local subscribers; used by the periodic timer.
    pub fn broadcast_snapshot(&self) {
        let snapshot = self.snapshot();
        self.feed.publish(FeedMessage::Snapshot(snapshot));
    }

    /// The local fan-out this dispatcher publishes to.
    pub fn feed(&self) -> &MarketFeed {
        &self.feed
    }

    async fn publish<T: Serialize>(&self, message: &T) {
        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(err) => {
                error!("failed to serialize outbound message: {}", err);
                return;
            }
        };
        if let Err(err) = self.publisher.publish(payload).await {
            // The in-engine state is authoritative; downstream reconciles.
            error!("failed to publish to bus: {}", err);
        }
    }
}
