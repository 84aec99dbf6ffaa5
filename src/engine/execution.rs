use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::DeskError;
use crate::fabric::Keyed;
use crate::market_data::{BidOffer, OrderBook, Side};

/// Crossing spread under which the book is tight enough to take. Strict:
/// a crossing spread of exactly 1.5/128 does not trade.
pub const TAKE_THRESHOLD: f64 = 1.5 / 128.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Fok,
    Ioc,
    Market,
    Limit,
    Stop,
}

/// The execution decision for a product. Zero visible quantity means
/// no-take; the price is still recorded for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOrder {
    pub product_id: String,
    pub side: Side,
    pub order_id: String,
    pub order_type: OrderType,
    pub price: f64,
    pub visible_quantity: i64,
    pub hidden_quantity: i64,
    pub parent_order_id: String,
    pub is_child: bool,
}

impl Keyed for ExecutionOrder {
    fn key(&self) -> &str {
        &self.product_id
    }
}

/// Chooses which side of the book a decision acts on. Implementations must
/// be deterministic or explicitly seeded.
pub trait SidePolicy: Send {
    fn choose(&mut self, top: &BidOffer) -> Side;
}

/// Alternates bid/offer on every decision. The default policy.
pub struct AlternatingSides {
    next: Side,
}

impl AlternatingSides {
    pub fn new() -> Self {
        Self { next: Side::Bid }
    }
}

impl Default for AlternatingSides {
    fn default() -> Self {
        Self::new()
    }
}

impl SidePolicy for AlternatingSides {
    fn choose(&mut self, _top: &BidOffer) -> Side {
        let side = self.next;
        self.next = match side {
            Side::Bid => Side::Offer,
            Side::Offer => Side::Bid,
        };
        side
    }
}

/// Seeded coin flip, for runs that want the original desk's behavior but
/// reproducibly.
pub struct SeededSides {
    rng: StdRng,
}

impl SeededSides {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl SidePolicy for SeededSides {
    fn choose(&mut self, _top: &BidOffer) -> Side {
        if self.rng.gen() {
            Side::Bid
        } else {
            Side::Offer
        }
    }
}

/// Hands out order id / parent order id pairs. Ids come from here, never
/// made up inside the decision path.
pub struct OrderIdAllocator {
    prefix: String,
    next_seq: u64,
}

impl OrderIdAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next_seq: 1 }
    }

    pub fn next_ids(&mut self) -> (String, String) {
        let seq = self.next_seq;
        self.next_seq += 1;
        (format!("{}-{:06}", self.prefix, seq), format!("{}-P-{:06}", self.prefix, seq))
    }
}

// Per-product running state: only the last decision.
struct ExecState {
    product_id: String,
    last: ExecutionOrder,
}

impl ExecState {
    // Zero-quantity placeholder so the first real event has a state to
    // replace.
    fn new(product_id: String, ids: &mut OrderIdAllocator) -> Self {
        let (order_id, parent_order_id) = ids.next_ids();
        let last = ExecutionOrder {
            product_id: product_id.clone(),
            side: Side::Bid,
            order_id,
            order_type: OrderType::Limit,
            price: 0.0,
            visible_quantity: 0,
            hidden_quantity: 0,
            parent_order_id,
            is_child: true,
        };
        Self { product_id, last }
    }

    fn apply(
        &mut self,
        book: &OrderBook,
        sides: &mut dyn SidePolicy,
        ids: &mut OrderIdAllocator,
    ) -> Option<ExecutionOrder> {
        if book.product_id != self.product_id {
            let e = DeskError::StateMismatch {
                expected: self.product_id.clone(),
                got: book.product_id.clone(),
            };
            warn!(error = %e, "execution state ignoring misrouted book");
            return None;
        }
        let Some(top) = book.best_bid_offer() else {
            warn!(product = %book.product_id, "book event with an empty side, no decision");
            return None;
        };

        let side = sides.choose(&top);
        let acted = match side {
            Side::Bid => top.bid,
            Side::Offer => top.offer,
        };
        // Take only when the book is tight enough to cross.
        let visible = if top.crossing_spread() < TAKE_THRESHOLD { acted.quantity } else { 0 };
        let (order_id, parent_order_id) = ids.next_ids();
        let order = ExecutionOrder {
            product_id: self.product_id.clone(),
            side,
            order_id,
            order_type: OrderType::Limit,
            price: acted.price,
            visible_quantity: visible,
            hidden_quantity: 2 * visible,
            parent_order_id,
            is_child: true,
        };
        self.last = order.clone();
        Some(order)
    }
}

/// Execution engine: one state per product, lazily created with a
/// zero-quantity placeholder. Pure state machine over best-of-book events;
/// the caller routes the emitted order downstream.
pub struct ExecutionEngine {
    states: HashMap<String, ExecState>,
    sides: Box<dyn SidePolicy>,
    ids: OrderIdAllocator,
}

impl ExecutionEngine {
    pub fn new(sides: Box<dyn SidePolicy>, ids: OrderIdAllocator) -> Self {
        Self { states: HashMap::new(), sides, ids }
    }

    pub fn on_book(&mut self, book: &OrderBook) -> Option<ExecutionOrder> {
        let state = self
            .states
            .entry(book.product_id.clone())
            .or_insert_with(|| ExecState::new(book.product_id.clone(), &mut self.ids));
        state.apply(book, self.sides.as_mut(), &mut self.ids)
    }

    pub fn last_order(&self, product_id: &str) -> Option<&ExecutionOrder> {
        self.states.get(product_id).map(|s| &s.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Order;
    use crate::ticks::parse_px;

    fn px(s: &str) -> f64 {
        parse_px(s).unwrap()
    }

    fn top(bid: &str, bid_qty: i64, offer: &str, offer_qty: i64) -> OrderBook {
        OrderBook::new(
            "91282CFV8",
            vec![Order::new(px(bid), bid_qty, Side::Bid)],
            vec![Order::new(px(offer), offer_qty, Side::Offer)],
        )
    }

    fn engine() -> ExecutionEngine {
        ExecutionEngine::new(Box::new(AlternatingSides::new()), OrderIdAllocator::new("EXE"))
    }

    #[test]
    fn wide_crossing_spread_does_not_trade() {
        let mut e = engine();
        // 99-000 / 99-010: crossing spread 1/32, well over 1.5/128
        let order = e.on_book(&top("99-000", 10_000_000, "99-010", 10_000_000)).unwrap();
        assert_eq!(order.visible_quantity, 0);
        assert_eq!(order.hidden_quantity, 0);
        // price still recorded for audit
        assert_eq!(order.price, px("99-000"));
        assert_eq!(order.order_type, OrderType::Limit);
        assert!(order.is_child);
    }

    #[test]
    fn tight_crossing_spread_takes_top_of_book() {
        let mut e = engine();
        // one tick wide: 1/256 < 1.5/128
        let order = e.on_book(&top("99-160", 10_000_000, "99-161", 20_000_000)).unwrap();
        assert_eq!(order.side, Side::Bid); // alternating policy starts on the bid
        assert_eq!(order.price, px("99-160"));
        assert_eq!(order.visible_quantity, 10_000_000);
        assert_eq!(order.hidden_quantity, 20_000_000);
    }

    #[test]
    fn threshold_is_strict() {
        let mut e = engine();
        // exactly 1.5/128 = 3/256 wide: no take
        let order = e.on_book(&top("99-160", 10_000_000, "99-163", 10_000_000)).unwrap();
        assert_eq!(order.visible_quantity, 0);
    }

    #[test]
    fn sides_alternate_deterministically() {
        let mut e = engine();
        let book = top("99-160", 10_000_000, "99-161", 20_000_000);
        let first = e.on_book(&book).unwrap();
        let second = e.on_book(&book).unwrap();
        let third = e.on_book(&book).unwrap();
        assert_eq!(first.side, Side::Bid);
        assert_eq!(second.side, Side::Offer);
        assert_eq!(second.price, px("99-161"));
        assert_eq!(second.visible_quantity, 20_000_000);
        assert_eq!(third.side, Side::Bid);
    }

    #[test]
    fn order_ids_come_from_the_allocator() {
        let mut e = engine();
        let book = top("99-160", 10_000_000, "99-161", 20_000_000);
        // first event also allocates the placeholder's ids
        let first = e.on_book(&book).unwrap();
        let second = e.on_book(&book).unwrap();
        assert_eq!(first.order_id, "EXE-000002");
        assert_eq!(first.parent_order_id, "EXE-P-000002");
        assert_eq!(second.order_id, "EXE-000003");
        assert_ne!(first.order_id, second.order_id);
    }

    #[test]
    fn seeded_sides_are_reproducible() {
        let book = top("99-160", 10_000_000, "99-161", 20_000_000);
        let best = book.best_bid_offer().unwrap();
        let mut a = SeededSides::new(7);
        let mut b = SeededSides::new(7);
        let picks_a: Vec<Side> = (0..16).map(|_| a.choose(&best)).collect();
        let picks_b: Vec<Side> = (0..16).map(|_| b.choose(&best)).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn misrouted_book_is_ignored() {
        let mut sides = AlternatingSides::new();
        let mut ids = OrderIdAllocator::new("EXE");
        let mut state = ExecState::new("91282CFV8".into(), &mut ids);
        let stray = OrderBook::new(
            "91282CFX4",
            vec![Order::new(px("99-160"), 1, Side::Bid)],
            vec![Order::new(px("99-161"), 1, Side::Offer)],
        );
        assert!(state.apply(&stray, &mut sides, &mut ids).is_none());
        assert_eq!(state.last.visible_quantity, 0);
    }

    #[test]
    fn last_order_tracks_replacement() {
        let mut e = engine();
        e.on_book(&top("99-160", 10_000_000, "99-161", 20_000_000));
        e.on_book(&top("99-000", 5_000_000, "99-010", 5_000_000));
        assert_eq!(e.last_order("91282CFV8").unwrap().visible_quantity, 0);
    }
}
