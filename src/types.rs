//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core data types used throughout the matching engine:
// orders, trades, the book side enum and price normalization.
//
// | Section            | Description                                              |
// |--------------------|----------------------------------------------------------|
// | ENUMS              | Side of the book (Bid/Ask) and its wire encoding.        |
// | STRUCTS            | Orders and the trades they produce.                      |
// | PRICES             | Fixed-point price normalization.                         |
// | Potential Errors   | Errors related to type decoding.                         |
// | TESTS              | Unit tests for the defined types.                        |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Number of fractional digits prices are kept at throughout the engine.
pub const PRICE_SCALE: u32 = 2;

//--------------------------------------------------------------------------------------------------
//  ENUMS
//--------------------------------------------------------------------------------------------------

/// Represents the side of an order. On the wire a bid is `1` and an ask is `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Side {
    /// A buy order.
    Bid,
    /// A sell order.
    Ask,
}

impl Side {
    /// Returns the side an incoming order matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Returns true if an order on this side with `limit` crosses the opposite
    /// side's `best` price.
    pub fn crosses(self, limit: Decimal, best: Decimal) -> bool {
        match self {
            Side::Bid => best <= limit,
            Side::Ask => best >= limit,
        }
    }
}

impl TryFrom<i8> for Side {
    type Error = TypeError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Side::Bid),
            -1 => Ok(Side::Ask),
            other => Err(TypeError::InvalidSide(other.to_string())),
        }
    }
}

impl From<Side> for i8 {
    fn from(side: Side) -> Self {
        match side {
            Side::Bid => 1,
            Side::Ask => -1,
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  STRUCTS
//--------------------------------------------------------------------------------------------------

/// A limit order, either incoming or resting on the book.
///
/// `remaining` only ever decreases through matching; a reprice replaces the
/// order's `price` but carries `remaining` over unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Unique identifier, assigned by the event producer or synthesized on admission.
    pub id: Uuid,
    /// Side of the book this order belongs to.
    pub side: Side,
    /// Normalized limit price, strictly positive.
    pub price: Decimal,
    /// Original quantity, immutable after creation.
    pub orig_qty: u64,
    /// Quantity still available to trade. Always `<= orig_qty`.
    pub remaining: u64,
    /// Arrival timestamp. Observability only; priority comes from queue position.
    pub ts: DateTime<Utc>,
}

impl Order {
    /// Creates a fully formed incoming order with `remaining == orig_qty`.
    pub fn new(id: Uuid, side: Side, price: Decimal, qty: u64) -> Self {
        Self {
            id,
            side,
            price,
            orig_qty: qty,
            remaining: qty,
            ts: Utc::now(),
        }
    }

    /// Quantity already filled through matching.
    pub fn filled(&self) -> u64 {
        self.orig_qty - self.remaining
    }
}

/// A completed trade between a bid order and an ask order.
///
/// The price is always the resting order's price; trades are immutable once
/// emitted and are published in the order they were produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    /// Unique identifier for the trade.
    pub id: Uuid,
    /// Execution price (the passive order's price).
    pub price: Decimal,
    /// Executed quantity.
    pub qty: u64,
    /// Id of the buy-side order in this trade.
    pub bid_order_id: Uuid,
    /// Id of the sell-side order in this trade.
    pub ask_order_id: Uuid,
    /// Timestamp when the trade occurred.
    pub ts: DateTime<Utc>,
}

impl Trade {
    /// Creates a trade with a fresh id and the current timestamp.
    pub fn new(price: Decimal, qty: u64, bid_order_id: Uuid, ask_order_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            price,
            qty,
            bid_order_id,
            ask_order_id,
            ts: Utc::now(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
//  PRICES
//--------------------------------------------------------------------------------------------------

/// Normalizes a price by truncation toward zero to [`PRICE_SCALE`] fractional digits.
///
/// Applied at every admission point (place and modify). Idempotent: normalizing
/// a normalized price returns the same value.
pub fn normalize_price(price: Decimal) -> Decimal {
    price.trunc_with_scale(PRICE_SCALE)
}

//--------------------------------------------------------------------------------------------------
//  Potential Errors
//--------------------------------------------------------------------------------------------------

/// Errors that can occur while decoding values into engine types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// An unrecognized side encoding (anything other than `1` or `-1`).
    #[error("Invalid side specified: {0}")]
    InvalidSide(String),
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------
