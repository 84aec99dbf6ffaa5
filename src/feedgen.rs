// Deterministic demo feeds in the wire formats the adapters decode.
// Prices walk between 99 and 101 one tick (1/256) at a time, up from 99 and
// back down from 101, with the quoted spread cycling 1/128 -> 3/256 -> 1/64.
// Market data carries five levels per side, one tick apart, 1M..5M sizes,
// with the top-of-book alternating between tight (one tick) and wide (1/32)
// so both execution branches fire. Product interleaving is round-robin.

use std::fmt::Write;

use crate::products::ProductCatalog;
use crate::ticks::format_px;

const LOW: i64 = 99 * 256;
const HIGH: i64 = 101 * 256;

/// Oscillating price walk on the 1/256 grid.
pub struct PriceWalk {
    ticks: i64,
    step: i64,
}

impl PriceWalk {
    pub fn new() -> Self {
        Self { ticks: LOW, step: 1 }
    }

    /// Next price in ticks of 1/256.
    pub fn next_ticks(&mut self) -> i64 {
        let current = self.ticks;
        if self.ticks == HIGH {
            self.step = -1;
        } else if self.ticks == LOW {
            self.step = 1;
        }
        self.ticks += self.step;
        current
    }
}

impl Default for PriceWalk {
    fn default() -> Self {
        Self::new()
    }
}

/// `code,price,spread` records, `per_product` rounds, products round-robin.
pub fn price_feed_text(catalog: &ProductCatalog, per_product: usize) -> String {
    let spreads = ["0-002", "0-003", "0-00+"]; // 1/128, 3/256, 1/64
    let cusips = catalog.cusips();
    let mut walks: Vec<PriceWalk> = cusips.iter().map(|_| PriceWalk::new()).collect();
    let mut out = String::new();
    for round in 0..per_product {
        for (walk, cusip) in walks.iter_mut().zip(&cusips) {
            let mid = format_px(walk.next_ticks() as f64 / 256.0);
            let spread = spreads[round % spreads.len()];
            writeln!(out, "{cusip},{mid},{spread}").expect("string write");
        }
    }
    out
}

/// `code,price,quantity,side` records, `snapshots_per_product` five-level
/// books per product, products round-robin. Even snapshots are one tick wide
/// at the top, odd snapshots 1/32 wide.
pub fn market_feed_text(catalog: &ProductCatalog, snapshots_per_product: usize) -> String {
    let cusips = catalog.cusips();
    let mut walks: Vec<PriceWalk> = cusips.iter().map(|_| PriceWalk::new()).collect();
    let mut out = String::new();
    for snapshot in 0..snapshots_per_product {
        let crossing: i64 = if snapshot % 2 == 0 { 1 } else { 8 };
        for (walk, cusip) in walks.iter_mut().zip(&cusips) {
            let mid = walk.next_ticks();
            let top_bid = mid - crossing / 2;
            let top_offer = top_bid + crossing;
            for level in 0..5i64 {
                let qty = (level + 1) * 1_000_000;
                let bid = format_px((top_bid - level) as f64 / 256.0);
                let offer = format_px((top_offer + level) as f64 / 256.0);
                writeln!(out, "{cusip},{bid},{qty},BID").expect("string write");
                writeln!(out, "{cusip},{offer},{qty},OFFER").expect("string write");
            }
        }
    }
    out
}
