use serde::{Deserialize, Serialize};

use crate::fabric::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Offer,
}

/// A market data order. Immutable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub price: f64,
    pub quantity: i64,
    pub side: Side,
}

impl Order {
    pub fn new(price: f64, quantity: i64, side: Side) -> Self {
        Self { price, quantity, side }
    }
}

/// Best order on each side of a book. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidOffer {
    pub bid: Order,
    pub offer: Order,
}

impl BidOffer {
    /// The crossing spread: gap between best offer and best bid.
    pub fn crossing_spread(&self) -> f64 {
        self.offer.price - self.bid.price
    }
}

/// Per-product bid/offer stacks. Each update replaces the whole snapshot, so
/// concurrent readers always see a consistent book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub product_id: String,
    pub bids: Vec<Order>,
    pub offers: Vec<Order>,
}

impl Keyed for OrderBook {
    fn key(&self) -> &str {
        &self.product_id
    }
}

impl OrderBook {
    pub fn new(product_id: impl Into<String>, bids: Vec<Order>, offers: Vec<Order>) -> Self {
        Self { product_id: product_id.into(), bids, offers }
    }

    /// Highest-priced bid and lowest-priced offer. Ties keep the first-seen
    /// order (stable scan). None when either side is empty — the feed never
    /// produces such a book.
    pub fn best_bid_offer(&self) -> Option<BidOffer> {
        let mut best_bid = *self.bids.first()?;
        for order in &self.bids[1..] {
            if order.price > best_bid.price {
                best_bid = *order;
            }
        }
        let mut best_offer = *self.offers.first()?;
        for order in &self.offers[1..] {
            if order.price < best_offer.price {
                best_offer = *order;
            }
        }
        Some(BidOffer { bid: best_bid, offer: best_offer })
    }

    /// Merge orders sharing a price into one synthetic order per side, with
    /// the quantities summed. Ordering is the insertion order of the first
    /// occurrence of each price. Pure projection; `self` is untouched.
    ///
    /// Price equality is exact: every book price sits on the 1/256 grid.
    pub fn aggregate_depth(&self) -> OrderBook {
        fn merge(orders: &[Order]) -> Vec<Order> {
            let mut merged: Vec<Order> = Vec::new();
            for order in orders {
                match merged.iter_mut().find(|m| m.price == order.price) {
                    Some(m) => m.quantity += order.quantity,
                    None => merged.push(*order),
                }
            }
            merged
        }
        OrderBook {
            product_id: self.product_id.clone(),
            bids: merge(&self.bids),
            offers: merge(&self.offers),
        }
    }

    /// One-level synthetic book carrying only the best of each side. This is
    /// what order-book listeners see; full depth stays inside the store.
    pub fn top_of_book(&self) -> Option<OrderBook> {
        let best = self.best_bid_offer()?;
        Some(OrderBook {
            product_id: self.product_id.clone(),
            bids: vec![best.bid],
            offers: vec![best.offer],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::parse_px;
    use proptest::prelude::*;

    fn px(s: &str) -> f64 {
        parse_px(s).unwrap()
    }

    fn book(bids: &[(&str, i64)], offers: &[(&str, i64)]) -> OrderBook {
        OrderBook::new(
            "91282CFV8",
            bids.iter().map(|&(p, q)| Order::new(px(p), q, Side::Bid)).collect(),
            offers.iter().map(|&(p, q)| Order::new(px(p), q, Side::Offer)).collect(),
        )
    }

    #[test]
    fn best_bid_is_max_best_offer_is_min() {
        let b = book(
            &[("99-310", 10_000_000), ("99-312", 20_000_000), ("99-311", 30_000_000)],
            &[("100-002", 10_000_000), ("100-001", 20_000_000), ("100-003", 30_000_000)],
        );
        let best = b.best_bid_offer().unwrap();
        assert_eq!(best.bid.price, px("99-312"));
        assert_eq!(best.bid.quantity, 20_000_000);
        assert_eq!(best.offer.price, px("100-001"));
        assert_eq!(best.offer.quantity, 20_000_000);
        // no order beats the reported best on its own side
        assert!(b.bids.iter().all(|o| o.price <= best.bid.price));
        assert!(b.offers.iter().all(|o| o.price >= best.offer.price));
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let b = book(
            &[("99-160", 1_000_000), ("99-160", 2_000_000)],
            &[("99-170", 3_000_000), ("99-170", 4_000_000)],
        );
        let best = b.best_bid_offer().unwrap();
        assert_eq!(best.bid.quantity, 1_000_000);
        assert_eq!(best.offer.quantity, 3_000_000);
    }

    #[test]
    fn empty_side_has_no_best() {
        let b = book(&[("99-160", 1_000_000)], &[]);
        assert!(b.best_bid_offer().is_none());
    }

    #[test]
    fn aggregate_merges_same_price_preserving_first_occurrence_order() {
        let b = book(
            &[("99-310", 10_000_000), ("99-312", 20_000_000), ("99-310", 5_000_000)],
            &[("100-001", 1_000_000)],
        );
        let agg = b.aggregate_depth();
        assert_eq!(agg.bids.len(), 2);
        assert_eq!(agg.bids[0].price, px("99-310"));
        assert_eq!(agg.bids[0].quantity, 15_000_000);
        assert_eq!(agg.bids[1].price, px("99-312"));
        assert_eq!(agg.bids[1].quantity, 20_000_000);
        assert_eq!(agg.offers, b.offers);
        // the source book is untouched
        assert_eq!(b.bids.len(), 3);
    }

    #[test]
    fn top_of_book_is_one_level() {
        let b = book(
            &[("99-310", 10_000_000), ("99-312", 20_000_000)],
            &[("100-002", 10_000_000), ("100-001", 20_000_000)],
        );
        let top = b.top_of_book().unwrap();
        assert_eq!(top.bids.len(), 1);
        assert_eq!(top.offers.len(), 1);
        assert_eq!(top.bids[0].price, px("99-312"));
        assert_eq!(top.offers[0].price, px("100-001"));
        assert_eq!(top.product_id, b.product_id);
    }

    // Quantities conserved and the projection idempotent, for arbitrary books
    // on the 1/256 grid.
    proptest! {
        #[test]
        fn aggregate_conserves_quantity_and_is_idempotent(
            bid_ticks in prop::collection::vec((25300i64..25700, 1i64..50_000_000), 1..20),
            offer_ticks in prop::collection::vec((25300i64..25700, 1i64..50_000_000), 1..20),
        ) {
            let b = OrderBook::new(
                "91282CFV8",
                bid_ticks.iter().map(|&(t, q)| Order::new(t as f64 / 256.0, q, Side::Bid)).collect(),
                offer_ticks.iter().map(|&(t, q)| Order::new(t as f64 / 256.0, q, Side::Offer)).collect(),
            );
            let once = b.aggregate_depth();
            let twice = once.aggregate_depth();
            prop_assert_eq!(&once, &twice);

            let total = |orders: &[Order]| orders.iter().map(|o| o.quantity).sum::<i64>();
            prop_assert_eq!(total(&once.bids), total(&b.bids));
            prop_assert_eq!(total(&once.offers), total(&b.offers));
            // every price appears at most once per side after merging
            for side in [&once.bids, &once.offers] {
                for (i, o) in side.iter().enumerate() {
                    prop_assert!(side[i + 1..].iter().all(|m| m.price != o.price));
                }
            }
        }
    }
}
