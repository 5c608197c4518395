//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the limit order book for a single trading instrument.
// It maintains bid and ask orders in price-time priority (FIFO within a price).
//
// | Component     | Description                                                               |
// |---------------|---------------------------------------------------------------------------|
// | PriceLevel    | FIFO queue of orders at one price with an aggregate remaining quantity    |
// | BookSide      | All levels for one side, with a lazily-pruned best-price index            |
// | OrderBook     | Both sides plus the order-id index; all mutation goes through admit/evict |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                                  | Return Type          |
// |-----------------------|----------------------------------------------|----------------------|
// | admit                 | Adds a resting order to book and index       | ()                   |
// | evict                 | Removes an order from book and index         | Option<Order>        |
// | cancel                | Cancels an order by id                       | bool                 |
// | modify                | Reprices an order, losing time priority      | bool                 |
// | fill_best             | Fills against the head of the best level    | Option<Fill>         |
// | best_price            | Best price on a side (lazy index cleanup)    | Option<Decimal>      |
//
//--------------------------------------------------------------------------------------------------
// TESTS
//--------------------------------------------------------------------------------------------------
// | Name                            | Description                                            |
// |---------------------------------|--------------------------------------------------------|
// | test_empty_book                 | Verifies initial empty state                           |
// | test_admit_and_best_price       | Best price tracking across admissions                  |
// | test_fifo_within_level          | FIFO ordering at one price                             |
// | test_cancel                     | Cancel removes order, aggregate and empty level        |
// | test_modify_moves_to_tail       | Reprice loses time priority                            |
// | test_fill_best                  | Partial and exhausting fills against the head          |
// | test_stale_index_entries        | Lazy cleanup of prices no longer in the book           |
//--------------------------------------------------------------------------------------------------

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::types::{Order, Side};

/// One price level: a FIFO queue of resting orders plus the sum of their
/// remaining quantities.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// The price shared by every order in this level.
    pub price: Decimal,
    queue: VecDeque<Order>,
    aggregate: u64,
}

impl PriceLevel {
    fn new(price: Decimal) -> Self {
        Self {
            price,
            queue: VecDeque::new(),
            aggregate: 0,
        }
    }

    fn push_back(&mut self, order: Order) {
        self.aggregate += order.remaining;
        self.queue.push_back(order);
    }

    /// Removes the order with `id` from the queue, keeping FIFO order of the rest.
    /// O(K) in the level depth; cancels and reprices are rare relative to fills.
    fn remove(&mut self, id: &Uuid) -> Option<Order> {
        let pos = self.queue.iter().position(|o| o.id == *id)?;
        let order = self.queue.remove(pos)?;
        if order.remaining > self.aggregate {
            warn!(
                price = %self.price,
                aggregate = self.aggregate,
                removed = order.remaining,
                "level aggregate underflow on remove, clamping to zero"
            );
        }
        self.aggregate = self.aggregate.saturating_sub(order.remaining);
        Some(order)
    }

    /// The oldest (highest-priority) order at this level.
    pub fn peek_head(&self) -> Option<&Order> {
        self.queue.front()
    }

    /// Iterates the resting orders in priority order, head first.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.queue.iter()
    }

    /// Sum of the remaining quantities of all queued orders.
    pub fn aggregate_remaining(&self) -> u64 {
        self.aggregate
    }

    pub fn order_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Heap entry ranking prices so that the top of the heap is always the best
/// price for its side: highest for bids, lowest for asks. Every entry in one
/// side's heap carries the same side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RankedPrice {
    side: Side,
    price: Decimal,
}

impl Ord for RankedPrice {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.side {
            Side::Bid => self.price.cmp(&other.price),
            Side::Ask => other.price.cmp(&self.price),
        }
    }
}

impl PartialOrd for RankedPrice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One side of the book: live price levels, the best-price index, and the set
/// of prices currently materialized.
///
/// The index may hold stale prices (levels already emptied and dropped); they
/// are pruned lazily the next time the best price is requested. `present`
/// guards the index against duplicate insertions of a live price.
#[derive(Debug)]
pub struct BookSide {
    side: Side,
    levels: HashMap<Decimal, PriceLevel>,
    price_index: BinaryHeap<RankedPrice>,
    present: HashSet<Decimal>,
}

impl BookSide {
    fn new(side: Side) -> Self {
        Self {
            side,
            levels: HashMap::new(),
            price_index: BinaryHeap::new(),
            present: HashSet::new(),
        }
    }

    /// Returns the best live price on this side, pruning stale index entries
    /// on the way. Amortized O(log L).
    pub fn best_price(&mut self) -> Option<Decimal> {
        while let Some(top) = self.price_index.peek() {
            let price = top.price;
            match self.levels.get(&price) {
                Some(level) if !level.is_empty() => return Some(price),
                _ => {
                    // Stale or empty entry: reap it and keep looking.
                    self.price_index.pop();
                    self.present.remove(&price);
                    self.levels.remove(&price);
                }
            }
        }
        None
    }

    /// The level at `price`, if one is live.
    pub fn level_at(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Iterates the live levels in no particular order.
    pub fn levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.values()
    }

    /// Live prices sorted best-first: descending for bids, ascending for asks.
    pub fn prices_best_first(&self) -> Vec<Decimal> {
        let mut prices: Vec<Decimal> = self.levels.keys().copied().collect();
        match self.side {
            Side::Bid => prices.sort_unstable_by(|a, b| b.cmp(a)),
            Side::Ask => prices.sort_unstable(),
        }
        prices
    }

    /// Number of live price levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn insert_into_level(&mut self, order: Order) {
        let price = order.price;
        let level = self
            .levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price));
        level.push_back(order);
        // One index entry per distinct live price; re-admissions of a price
        // whose old entry is still awaiting lazy reaping push a fresh one.
        if self.present.insert(price) {
            self.price_index.push(RankedPrice {
                side: self.side,
                price,
            });
        }
    }

    fn drop_empty_level(&mut self, price: Decimal) {
        self.levels.remove(&price);
        self.present.remove(&price);
        // The price_index entry is reaped lazily by best_price.
    }
}

/// Result of filling against the head order of the best level on a side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    /// Id of the resting order that was hit.
    pub resting_id: Uuid,
    /// The resting order's price (the passive price).
    pub price: Decimal,
    /// Quantity executed.
    pub qty: u64,
}

/// The two-sided book plus the order-id index.
///
/// An order is in the book iff it is in the index and in exactly one level
/// queue on its side at its current price. That invariant holds because every
/// insertion goes through [`OrderBook::admit`] and every removal through
/// [`OrderBook::evict`] or the fill path.
#[derive(Debug)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
    index: HashMap<Uuid, (Side, Decimal)>,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            index: HashMap::new(),
        }
    }

    /// The requested side of the book.
    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Best live price on `side`.
    pub fn best_price(&mut self, side: Side) -> Option<Decimal> {
        self.side_mut(side).best_price()
    }

    /// Admits a resting order: appends it to its price level (creating the
    /// level on first use) and records it in the order index.
    pub fn admit(&mut self, order: Order) {
        let (id, side, price) = (order.id, order.side, order.price);
        self.side_mut(side).insert_into_level(order);
        self.index.insert(id, (side, price));
    }

    /// Evicts an order from its level and the index, returning it.
    ///
    /// Drops the level if it becomes empty. Returns `None` for unknown ids.
    pub fn evict(&mut self, id: &Uuid) -> Option<Order> {
        let (side, price) = self.index.remove(id)?;
        let book_side = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };

        let removed = book_side
            .levels
            .get_mut(&price)
            .and_then(|level| level.remove(id));
        if removed.is_none() {
            warn!(%id, %price, "order was indexed but not found in its level");
        }

        if book_side.levels.get(&price).is_some_and(|l| l.is_empty()) {
            book_side.drop_empty_level(price);
        }
        removed
    }

    /// Cancels an order by id. Returns false when the id is unknown, leaving
    /// the book untouched.
    pub fn cancel(&mut self, id: &Uuid) -> bool {
        self.evict(id).is_some()
    }

    /// Reprices an order, preserving its id, side and remaining quantity.
    ///
    /// The order is evicted and re-admitted at `new_price`, so it always moves
    /// to the tail of the new level, losing time priority even when the price
    /// is unchanged. Returns false when the id is unknown.
    pub fn modify(&mut self, id: &Uuid, new_price: Decimal) -> bool {
        match self.evict(id) {
            Some(mut order) => {
                order.price = new_price;
                self.admit(order);
                true
            }
            None => false,
        }
    }

    /// Fills up to `take` against the head order of the best level on `side`.
    ///
    /// Decrements the head's remaining and the level aggregate, evicts the
    /// head when exhausted, and drops the level when it empties. Returns
    /// `None` when the side is empty.
    pub fn fill_best(&mut self, side: Side, take: u64) -> Option<Fill> {
        let book_side = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let best = book_side.best_price()?;

        // best_price guarantees a live non-empty level at `best`.
        let level = book_side.levels.get_mut(&best)?;
        let head = level.queue.front_mut()?;

        let qty = take.min(head.remaining);
        head.remaining -= qty;
        let resting_id = head.id;
        let exhausted = head.remaining == 0;

        if qty > level.aggregate {
            warn!(
                price = %best,
                aggregate = level.aggregate,
                filled = qty,
                "level aggregate underflow on fill, clamping to zero"
            );
        }
        level.aggregate = level.aggregate.saturating_sub(qty);

        if exhausted {
            level.queue.pop_front();
        }
        let now_empty = level.queue.is_empty();
        if now_empty {
            book_side.drop_empty_level(best);
        }
        if exhausted {
            self.index.remove(&resting_id);
        }

        Some(Fill {
            resting_id,
            price: best,
            qty,
        })
    }

    /// Looks up a resting order by id.
    pub fn order(&self, id: &Uuid) -> Option<&Order> {
        let (side, price) = self.index.get(id)?;
        self.side(*side)
            .level_at(*price)?
            .orders()
            .find(|o| o.id == *id)
    }

    /// True if `id` currently rests on the book.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.index.contains_key(id)
    }

    /// Number of resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
