//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module builds immutable top-of-book depth views from the order book.
//
// | Component      | Description                                              |
// |----------------|----------------------------------------------------------|
// | DepthLevel     | One aggregated price level as exposed externally         |
// | DepthSnapshot  | Point-in-time top-N view: bids descending, asks ascending|
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orderbook::OrderBook;
use crate::types::Side;

/// Number of price levels per side exposed externally by default.
pub const DEFAULT_DEPTH: usize = 5;

/// One aggregated price level in a depth view.
///
/// Prices are rendered as JSON numbers; this is the only place decimals leave
/// the fixed-point domain, and only for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// The level's price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// The level's aggregate remaining quantity.
    pub quantity: u64,
}

/// An immutable snapshot of order book depth at a specific point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Bid levels ordered by price descending (best bid first).
    pub bids: Vec<DepthLevel>,
    /// Ask levels ordered by price ascending (best ask first).
    pub asks: Vec<DepthLevel>,
}

impl DepthSnapshot {
    /// Captures the top `depth` levels of each side of `book`.
    pub fn capture(book: &OrderBook, depth: usize) -> Self {
        let levels = |side: Side| -> Vec<DepthLevel> {
            book.side(side)
                .prices_best_first()
                .into_iter()
                .take(depth)
                .map(|price| DepthLevel {
                    price,
                    quantity: book
                        .side(side)
                        .level_at(price)
                        .map_or(0, |level| level.aggregate_remaining()),
                })
                .collect()
        };

        Self {
            bids: levels(Side::Bid),
            asks: levels(Side::Ask),
        }
    }

    /// Returns the best bid price, if any bids are present.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|level| level.price)
    }

    /// Returns the best ask price, if any asks are present.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|level| level.price)
    }

    /// Returns the current spread (best ask - best bid).
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }
}
