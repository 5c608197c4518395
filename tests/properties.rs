//! Property-based invariant checks: random interleavings of places, cancels
//! and reprices must preserve the book's structural invariants after every
//! event.

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use lob_engine::{MatchingEngine, Order, Side, Trade};

#[derive(Debug, Clone)]
enum Step {
    Place { bid: bool, price_cents: i64, qty: u64 },
    Cancel { pick: usize },
    Modify { pick: usize, price_cents: i64 },
}

fn price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn place_step() -> impl Strategy<Value = Step> {
    (any::<bool>(), 900i64..1100, 1u64..20).prop_map(|(bid, price_cents, qty)| Step::Place {
        bid,
        price_cents,
        qty,
    })
}

fn place_or_cancel() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => place_step(),
        1 => (0usize..64).prop_map(|pick| Step::Cancel { pick }),
    ]
}

fn any_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => place_step(),
        1 => (0usize..64).prop_map(|pick| Step::Cancel { pick }),
        1 => ((0usize..64), 900i64..1100)
            .prop_map(|(pick, price_cents)| Step::Modify { pick, price_cents }),
    ]
}

/// Drives an engine through generated steps while recording enough history to
/// check conservation afterwards.
struct Harness {
    engine: MatchingEngine,
    placed: Vec<Uuid>,
    orig_qty: HashMap<Uuid, u64>,
    trades: Vec<Trade>,
}

impl Harness {
    fn new() -> Self {
        Self {
            engine: MatchingEngine::new(),
            placed: Vec::new(),
            orig_qty: HashMap::new(),
            trades: Vec::new(),
        }
    }

    fn apply(&mut self, step: &Step) {
        match step {
            Step::Place {
                bid,
                price_cents,
                qty,
            } => {
                let side = if *bid { Side::Bid } else { Side::Ask };
                let order = Order::new(Uuid::new_v4(), side, price(*price_cents), *qty);
                self.placed.push(order.id);
                self.orig_qty.insert(order.id, order.orig_qty);
                let trades = self.engine.submit(order);
                self.trades.extend(trades);
            }
            Step::Cancel { pick } => {
                if let Some(id) = self.pick(*pick) {
                    let _ = self.engine.cancel(&id);
                }
            }
            Step::Modify { pick, price_cents } => {
                if let Some(id) = self.pick(*pick) {
                    let _ = self.engine.modify(&id, price(*price_cents));
                }
            }
        }
    }

    fn pick(&self, pick: usize) -> Option<Uuid> {
        if self.placed.is_empty() {
            None
        } else {
            Some(self.placed[pick % self.placed.len()])
        }
    }

    fn resting_orders(&self) -> Vec<&Order> {
        let book = self.engine.book();
        [Side::Bid, Side::Ask]
            .into_iter()
            .flat_map(|side| book.side(side).levels().flat_map(|level| level.orders()))
            .collect()
    }

    /// Every live level's aggregate equals the sum of its queued remainings,
    /// and no empty level survives in the book.
    fn check_aggregates(&self) {
        for side in [Side::Bid, Side::Ask] {
            for level in self.engine.book().side(side).levels() {
                let sum: u64 = level.orders().map(|o| o.remaining).sum();
                assert_eq!(
                    level.aggregate_remaining(),
                    sum,
                    "aggregate mismatch at {}",
                    level.price
                );
                assert!(!level.is_empty(), "empty level left at {}", level.price);
            }
        }
    }

    /// The set of ids in the order index equals the set of ids queued across
    /// all price levels.
    fn check_bijection(&self) {
        let book = self.engine.book();
        let queued: Vec<Uuid> = self.resting_orders().iter().map(|o| o.id).collect();
        assert_eq!(book.order_count(), queued.len());
        for id in &queued {
            assert!(book.contains(id), "queued order {} missing from index", id);
        }
    }

    /// For every resting order, remaining plus the quantity it traded equals
    /// its original quantity.
    fn check_conservation(&self) {
        for order in self.resting_orders() {
            let executed: u64 = self
                .trades
                .iter()
                .filter(|t| t.bid_order_id == order.id || t.ask_order_id == order.id)
                .map(|t| t.qty)
                .sum();
            assert_eq!(
                order.remaining + executed,
                self.orig_qty[&order.id],
                "conservation violated for {}",
                order.id
            );
            assert!(order.remaining > 0, "exhausted order {} still resting", order.id);
        }
    }
}

proptest! {
    /// Without reprices the book can never rest crossed: matching resolves
    /// any crossing before an order is admitted.
    #[test]
    fn no_cross_at_rest_under_places_and_cancels(
        steps in prop::collection::vec(place_or_cancel(), 1..60)
    ) {
        let mut harness = Harness::new();
        for step in &steps {
            harness.apply(step);
            harness.check_aggregates();
            harness.check_bijection();
            harness.check_conservation();

            let snapshot = harness.engine.depth(1);
            if let (Some(bid), Some(ask)) = (snapshot.best_bid(), snapshot.best_ask()) {
                prop_assert!(bid < ask, "book rests crossed: bid {} >= ask {}", bid, ask);
            }
        }
    }

    /// Reprices never re-match and may leave the book transiently crossed,
    /// but the structural invariants still hold after every event.
    #[test]
    fn structural_invariants_hold_with_reprices(
        steps in prop::collection::vec(any_step(), 1..60)
    ) {
        let mut harness = Harness::new();
        for step in &steps {
            harness.apply(step);
            harness.check_aggregates();
            harness.check_bijection();
            harness.check_conservation();
        }
    }

    /// The quantity executed across all trades for any order never exceeds
    /// what was placed, whether or not the order still rests.
    #[test]
    fn executed_quantity_bounded_by_placed(
        steps in prop::collection::vec(any_step(), 1..60)
    ) {
        let mut harness = Harness::new();
        for step in &steps {
            harness.apply(step);
        }
        let mut executed: HashMap<Uuid, u64> = HashMap::new();
        for trade in &harness.trades {
            *executed.entry(trade.bid_order_id).or_default() += trade.qty;
            *executed.entry(trade.ask_order_id).or_default() += trade.qty;
        }
        for (id, total) in executed {
            prop_assert!(total <= harness.orig_qty[&id]);
        }
    }
}
