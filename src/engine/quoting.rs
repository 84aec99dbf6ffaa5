use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::DeskError;
use crate::fabric::Keyed;
use crate::market_data::Side;
use crate::pricing::ReferencePrice;

/// Spread at or under which the desk commits size. 1/128th is the tightest
/// spread the price feed produces; the boundary is inclusive.
pub const TIGHT_SPREAD: f64 = 1.0 / 128.0;

/// One side of a published price stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteOrder {
    pub price: f64,
    pub visible_quantity: i64,
    pub hidden_quantity: i64,
    pub side: Side,
}

/// Two-sided quote for a product, fully replaced on each recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub product_id: String,
    pub bid: QuoteOrder,
    pub offer: QuoteOrder,
}

impl Keyed for Quote {
    fn key(&self) -> &str {
        &self.product_id
    }
}

/// Picks the visible lot for a committed quote. Implementations must be
/// deterministic or explicitly seeded; there is no ambient randomness.
pub trait LotPolicy: Send {
    fn next_lot(&mut self) -> i64;
}

/// Walks a fixed lot set round-robin. The default policy.
pub struct CyclingLots {
    lots: Vec<i64>,
    cursor: usize,
}

pub const DEFAULT_LOTS: [i64; 2] = [1_000_000, 2_000_000];

impl CyclingLots {
    pub fn new(lots: Vec<i64>) -> Self {
        assert!(!lots.is_empty(), "lot set must not be empty");
        Self { lots, cursor: 0 }
    }
}

impl Default for CyclingLots {
    fn default() -> Self {
        Self::new(DEFAULT_LOTS.to_vec())
    }
}

impl LotPolicy for CyclingLots {
    fn next_lot(&mut self) -> i64 {
        let lot = self.lots[self.cursor];
        self.cursor = (self.cursor + 1) % self.lots.len();
        lot
    }
}

/// Draws from a fixed lot set with an explicitly seeded generator, for runs
/// that want the original desk's jitter but reproducibly.
pub struct SeededLots {
    lots: Vec<i64>,
    rng: StdRng,
}

impl SeededLots {
    pub fn new(lots: Vec<i64>, seed: u64) -> Self {
        assert!(!lots.is_empty(), "lot set must not be empty");
        Self { lots, rng: StdRng::seed_from_u64(seed) }
    }
}

impl LotPolicy for SeededLots {
    fn next_lot(&mut self) -> i64 {
        self.lots[self.rng.gen_range(0..self.lots.len())]
    }
}

// Per-product running state: only the last quote.
struct QuoteState {
    product_id: String,
    last: Quote,
}

impl QuoteState {
    fn new(product_id: String) -> Self {
        let idle = |side| QuoteOrder { price: 0.0, visible_quantity: 0, hidden_quantity: 0, side };
        let last = Quote {
            product_id: product_id.clone(),
            bid: idle(Side::Bid),
            offer: idle(Side::Offer),
        };
        Self { product_id, last }
    }

    fn apply(&mut self, price: &ReferencePrice, lots: &mut dyn LotPolicy) -> Option<Quote> {
        if price.product_id != self.product_id {
            let e = DeskError::StateMismatch {
                expected: self.product_id.clone(),
                got: price.product_id.clone(),
            };
            warn!(error = %e, "quote state ignoring misrouted price");
            return None;
        }

        let bid_px = price.mid - price.spread / 2.0;
        let offer_px = price.mid + price.spread / 2.0;
        let (visible, hidden) = if price.spread <= TIGHT_SPREAD {
            // At the tightest observed spread the desk shows size; adverse
            // selection risk is lowest there.
            let lot = lots.next_lot();
            (lot, 2 * lot)
        } else {
            // Indicative two-sided price, no committed size.
            (0, 0)
        };

        let quote = Quote {
            product_id: self.product_id.clone(),
            bid: QuoteOrder {
                price: bid_px,
                visible_quantity: visible,
                hidden_quantity: hidden,
                side: Side::Bid,
            },
            offer: QuoteOrder {
                price: offer_px,
                visible_quantity: visible,
                hidden_quantity: hidden,
                side: Side::Offer,
            },
        };
        self.last = quote.clone();
        Some(quote)
    }
}

/// Streaming quote engine: one state per product, created on the first
/// reference price and kept forever. Pure state machine — no I/O; the caller
/// routes the emitted quote downstream.
pub struct QuoteEngine {
    states: HashMap<String, QuoteState>,
    lots: Box<dyn LotPolicy>,
}

impl QuoteEngine {
    pub fn new(lots: Box<dyn LotPolicy>) -> Self {
        Self { states: HashMap::new(), lots }
    }

    pub fn on_price(&mut self, price: &ReferencePrice) -> Option<Quote> {
        let state = self
            .states
            .entry(price.product_id.clone())
            .or_insert_with(|| QuoteState::new(price.product_id.clone()));
        state.apply(price, self.lots.as_mut())
    }

    pub fn last_quote(&self, product_id: &str) -> Option<&Quote> {
        self.states.get(product_id).map(|s| &s.last)
    }
}
