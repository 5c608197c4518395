use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::depth::DepthSnapshot;
use crate::types::{Side, Trade};

/// Inbound order events as delivered on the bus, tagged by `action`.
///
/// Prices arrive as decimal strings or numbers; quantities as positive
/// integers. Anything that fails to deserialize is treated as malformed and
/// dropped by the dispatcher; a well-formed message with an unrecognized
/// action lands on [`InboundEvent::Unknown`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum InboundEvent {
    /// Place a new limit order. The id is synthesized when absent.
    Place {
        #[serde(default)]
        order_id: Option<Uuid>,
        side: Side,
        price: Decimal,
        quantity: u64,
    },
    /// Cancel a resting order.
    Cancel { order_id: Uuid },
    /// Reprice a resting order. Quantity is not modifiable.
    Modify { order_id: Uuid, price: Decimal },
    /// Any action this engine does not recognize.
    #[serde(other)]
    Unknown,
}

/// One executed trade as published downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExecution {
    pub unique_id: Uuid,
    pub execution_timestamp: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u64,
    pub bid_order_id: Uuid,
    pub ask_order_id: Uuid,
}

impl From<&Trade> for TradeExecution {
    fn from(trade: &Trade) -> Self {
        Self {
            unique_id: trade.id,
            execution_timestamp: trade.ts,
            price: trade.price,
            quantity: trade.qty,
            bid_order_id: trade.bid_order_id,
            ask_order_id: trade.ask_order_id,
        }
    }
}

/// The trades produced by a single incoming order, published as one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeBurst {
    pub trades: Vec<TradeExecution>,
}

/// Outcome of a cancel or modify request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: Uuid,
    pub success: bool,
}

/// Acknowledgement envelope: serializes to `{"cancel_ack": {...}}` or
/// `{"modify_ack": {...}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AckMessage {
    #[serde(rename = "cancel_ack")]
    Cancel(OrderAck),
    #[serde(rename = "modify_ack")]
    Modify(OrderAck),
}

/// Messages delivered to local market-data subscribers.
///
/// Serializes to `{"type":"snapshot","data":{...}}` and
/// `{"type":"trade","data":[...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FeedMessage {
    Snapshot(DepthSnapshot),
    Trade(Vec<TradeExecution>),
}
