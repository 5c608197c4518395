//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the core matching logic: crossing an incoming limit
// order against the opposite side of the book under price-time priority.
//
// | Component      | Description                                                 |
// |----------------|-------------------------------------------------------------|
// | MatchingEngine | Wraps the order book; produces trades from incoming orders  |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                        | Return Type       |
// |---------------|----------------------------------------------------|-------------------|
// | submit        | Matches an incoming order, rests any remainder     | Vec<Trade>        |
// | cancel        | Cancels a resting order by id                      | bool              |
// | modify        | Reprices a resting order (no re-match)             | bool              |
// | depth         | Builds a top-N depth snapshot                      | DepthSnapshot     |
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::depth::DepthSnapshot;
use crate::orderbook::OrderBook;
use crate::types::{Order, Side, Trade, normalize_price};

/// The matching engine for a single instrument.
///
/// All methods take `&mut self`; callers serialize access (the dispatcher
/// holds the process lock around every call).
#[derive(Debug, Default)]
pub struct MatchingEngine {
    book: OrderBook,
}

impl MatchingEngine {
    /// Creates an engine with an empty book.
    pub fn new() -> Self {
        Self {
            book: OrderBook::new(),
        }
    }

    /// Matches `incoming` against the opposite side under price-time priority.
    ///
    /// Walks the opposite side's best price while it crosses the incoming
    /// limit, filling against the head of each level at the resting order's
    /// price. Any unfilled remainder is admitted to the incoming order's own
    /// side. Returns the trades in the order they were produced:
    /// best-price-first, FIFO within a level.
    pub fn submit(&mut self, mut incoming: Order) -> Vec<Trade> {
        let opp = incoming.side.opposite();
        let mut trades = Vec::new();

        while incoming.remaining > 0 {
            let Some(best) = self.book.best_price(opp) else {
                break;
            };
            if !incoming.side.crosses(incoming.price, best) {
                break;
            }

            let Some(fill) = self.book.fill_best(opp, incoming.remaining) else {
                break;
            };
            incoming.remaining -= fill.qty;

            let trade = match incoming.side {
                Side::Bid => Trade::new(fill.price, fill.qty, incoming.id, fill.resting_id),
                Side::Ask => Trade::new(fill.price, fill.qty, fill.resting_id, incoming.id),
            };
            debug!(
                trade_id = %trade.id,
                price = %trade.price,
                qty = trade.qty,
                "trade executed"
            );
            trades.push(trade);
        }

        if incoming.remaining > 0 {
            self.book.admit(incoming);
        }
        trades
    }

    /// Cancels a resting order. Returns false for unknown ids.
    pub fn cancel(&mut self, id: &Uuid) -> bool {
        self.book.cancel(id)
    }

    /// Reprices a resting order to the normalized `new_price`.
    ///
    /// The order keeps its id, side and remaining quantity but moves to the
    /// tail of the new level. Repricing never emits trades; a crossed book
    /// after a reprice stays crossed until the next incoming order.
    /// Returns false for unknown ids.
    pub fn modify(&mut self, id: &Uuid, new_price: Decimal) -> bool {
        self.book.modify(id, normalize_price(new_price))
    }

    /// Builds a point-in-time top-`depth` view of the book.
    pub fn depth(&self, depth: usize) -> DepthSnapshot {
        DepthSnapshot::capture(&self.book, depth)
    }

    /// Read access to the book, mainly for tests and invariant checks.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }
}
