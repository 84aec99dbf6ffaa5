use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::errors::{DeskError, DeskResult};
use crate::fabric::{InboundAdapter, Store};
use crate::market_data::book::{Order, OrderBook, Side};
use crate::products::ProductCatalog;
use crate::ticks;

/// Number of price levels per side in one book snapshot on the wire.
pub const LEVELS_PER_SIDE: usize = 5;

/// Decode one `code,price,quantity,side` market data record.
pub fn decode_order(line: &str, catalog: &ProductCatalog) -> DeskResult<(String, Order)> {
    let malformed = |reason: &str| DeskError::MalformedRecord {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 4 {
        return Err(malformed("expected code,price,quantity,side"));
    }
    let cusip = fields[0];
    if !catalog.contains(cusip) {
        return Err(DeskError::UnknownProduct(cusip.to_string()));
    }
    let price = ticks::parse_px(fields[1])?;
    let quantity: i64 = fields[2].parse().map_err(|_| malformed("quantity not a number"))?;
    if quantity <= 0 {
        return Err(malformed("quantity must be positive"));
    }
    let side = match fields[3] {
        "BID" => Side::Bid,
        "OFFER" => Side::Offer,
        _ => return Err(malformed("side must be BID or OFFER")),
    };
    Ok((cusip.to_string(), Order::new(price, quantity, side)))
}

// Orders collected for one product until its snapshot is complete.
struct Assembly {
    product_id: String,
    bids: Vec<Order>,
    offers: Vec<Order>,
}

impl Assembly {
    fn new(product_id: String) -> Self {
        Self { product_id, bids: Vec::new(), offers: Vec::new() }
    }

    fn push(&mut self, order: Order) {
        match order.side {
            Side::Bid => self.bids.push(order),
            Side::Offer => self.offers.push(order),
        }
    }

    fn complete(&self) -> bool {
        self.bids.len() >= LEVELS_PER_SIDE && self.offers.len() >= LEVELS_PER_SIDE
    }

    fn into_book(self) -> OrderBook {
        OrderBook::new(self.product_id, self.bids, self.offers)
    }
}

/// Inbound adapter for the market data stream. Records arrive one price level
/// at a time; a book snapshot is pushed into the store once both sides are
/// fully populated, the stream moves to another product, or the stream ends.
/// Malformed records are logged and skipped.
pub struct MarketDataFeed<R> {
    reader: BufReader<R>,
    store: Arc<dyn Store<OrderBook>>,
    catalog: Arc<ProductCatalog>,
}

impl<R: tokio::io::AsyncRead + Unpin + Send> MarketDataFeed<R> {
    pub fn new(source: R, store: Arc<dyn Store<OrderBook>>, catalog: Arc<ProductCatalog>) -> Self {
        Self { reader: BufReader::new(source), store, catalog }
    }
}

#[async_trait]
impl<R: tokio::io::AsyncRead + Unpin + Send> InboundAdapter for MarketDataFeed<R> {
    async fn subscribe(&mut self) -> DeskResult<u64> {
        let mut accepted = 0u64;
        let mut books = 0u64;
        let mut assembly: Option<Assembly> = None;
        let mut lines = (&mut self.reader).lines();

        while let Some(line) =
            lines.next_line().await.map_err(|e| DeskError::Io(e.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            let (cusip, order) = match decode_order(&line, &self.catalog) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(error = %e, "dropping market data record");
                    continue;
                }
            };
            accepted += 1;

            if assembly.as_ref().is_some_and(|a| a.product_id != cusip) {
                if let Some(prev) = assembly.take() {
                    self.store.on_message(prev.into_book());
                    books += 1;
                }
            }
            let a = assembly.get_or_insert_with(|| Assembly::new(cusip));
            a.push(order);
            if a.complete() {
                if let Some(done) = assembly.take() {
                    self.store.on_message(done.into_book());
                    books += 1;
                }
            }
        }
        if let Some(a) = assembly.take() {
            self.store.on_message(a.into_book());
            books += 1;
        }
        info!(records = accepted, books, "market data stream drained");
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::service::MarketDataStore;
    use crate::ticks::parse_px;

    fn catalog() -> Arc<ProductCatalog> {
        Arc::new(ProductCatalog::on_the_run())
    }

    #[test]
    fn decodes_a_record() {
        let (cusip, order) = decode_order("91282CFV8,99-31+,1000000,BID", &catalog()).unwrap();
        assert_eq!(cusip, "91282CFV8");
        assert_eq!(order.price, parse_px("99-31+").unwrap());
        assert_eq!(order.quantity, 1_000_000);
        assert_eq!(order.side, Side::Bid);
    }

    #[test]
    fn rejects_bad_records() {
        let c = catalog();
        assert!(decode_order("91282CFV8,99-31+,1000000", &c).is_err());
        assert!(decode_order("91282CFV8,99-31+,lots,BID", &c).is_err());
        assert!(decode_order("91282CFV8,99-31+,1000000,SHORT", &c).is_err());
        assert!(decode_order("91282CFV8,garbage,1000000,BID", &c).is_err());
        assert_eq!(
            decode_order("912828XX0,99-31+,1000000,BID", &c),
            Err(DeskError::UnknownProduct("912828XX0".into()))
        );
    }

    fn five_levels(cusip: &str) -> String {
        let bids = ["99-316", "99-315", "99-31+", "99-313", "99-312"];
        let offers = ["100-301", "100-302", "100-303", "100-30+", "100-315"];
        let mut out = String::new();
        for (i, (b, o)) in bids.iter().zip(offers.iter()).enumerate() {
            let qty = (i + 1) * 1_000_000;
            out.push_str(&format!("{cusip},{b},{qty},BID\n"));
            out.push_str(&format!("{cusip},{o},{qty},OFFER\n"));
        }
        out
    }

    #[tokio::test]
    async fn assembles_snapshots_and_skips_malformed() {
        let mut data = five_levels("91282CFV8");
        data.push_str("this is not a record\n");
        data.push_str(&five_levels("91282CFX4"));

        let store = Arc::new(MarketDataStore::new());
        let mut feed = MarketDataFeed::new(data.as_bytes(), store.clone(), catalog());
        let accepted = feed.subscribe().await.unwrap();
        assert_eq!(accepted, 20);

        let best = store.best_bid_offer("91282CFV8").unwrap();
        assert_eq!(best.bid.price, parse_px("99-316").unwrap());
        assert_eq!(best.offer.price, parse_px("100-301").unwrap());
        assert_eq!(store.get("91282CFX4").unwrap().bids.len(), 5);
    }

    #[tokio::test]
    async fn product_switch_flushes_partial_snapshot() {
        let data = "91282CFV8,99-310,1000000,BID\n\
                    91282CFV8,100-000,1000000,OFFER\n\
                    91282CFX4,99-000,2000000,BID\n\
                    91282CFX4,99-010,2000000,OFFER\n";
        let store = Arc::new(MarketDataStore::new());
        let mut feed = MarketDataFeed::new(data.as_bytes(), store.clone(), catalog());
        feed.subscribe().await.unwrap();

        // both partial books were emitted, one per product
        assert_eq!(store.get("91282CFV8").unwrap().bids.len(), 1);
        assert_eq!(store.get("91282CFX4").unwrap().offers.len(), 1);
    }
}
