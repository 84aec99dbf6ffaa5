use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::errors::{DeskError, DeskResult};
use crate::fabric::{Keyed, Listener, Store};
use crate::market_data::book::{BidOffer, OrderBook};

/// Store distributing order book market data, keyed on product id.
///
/// Listeners never see full depth: each accepted book is reduced to a
/// one-level best-bid-offer snapshot before notification, which keeps the
/// downstream decision surface small and bounded. Full depth stays queryable
/// through `get` / `aggregate_depth`.
pub struct MarketDataStore {
    gate: Mutex<()>,
    books: Mutex<HashMap<String, OrderBook>>,
    listeners: RwLock<Vec<Arc<dyn Listener<OrderBook>>>>,
}

const STORE_NAME: &str = "market-data";

impl MarketDataStore {
    pub fn new() -> Self {
        Self {
            gate: Mutex::new(()),
            books: Mutex::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Best bid and offer for a product. The stored book always has both
    /// sides populated (feed precondition), so a miss means the product has
    /// no book yet.
    pub fn best_bid_offer(&self, product_id: &str) -> DeskResult<BidOffer> {
        let books = self.books.lock();
        let book = books
            .get(product_id)
            .ok_or_else(|| DeskError::UnknownProduct(product_id.to_string()))?;
        book.best_bid_offer()
            .ok_or_else(|| DeskError::UnknownProduct(product_id.to_string()))
    }

    /// Depth-aggregated projection of the stored book. Does not mutate it.
    pub fn aggregate_depth(&self, product_id: &str) -> DeskResult<OrderBook> {
        let books = self.books.lock();
        let book = books
            .get(product_id)
            .ok_or_else(|| DeskError::UnknownProduct(product_id.to_string()))?;
        Ok(book.aggregate_depth())
    }
}

impl Default for MarketDataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store<OrderBook> for MarketDataStore {
    fn get(&self, key: &str) -> DeskResult<OrderBook> {
        self.books
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| DeskError::NotFound { store: STORE_NAME, key: key.to_string() })
    }

    fn on_message(&self, book: OrderBook) {
        let _gate = self.gate.lock();
        let top = book.top_of_book();
        let key = book.key().to_string();
        debug!(
            store = STORE_NAME,
            product = %key,
            bids = book.bids.len(),
            offers = book.offers.len(),
            "book replaced"
        );
        self.books.lock().insert(key.clone(), book);
        match top {
            Some(top) => {
                for listener in self.listeners.read().iter() {
                    listener.on_add(&top);
                }
            }
            // One-sided book: nothing to decide on downstream. Snapshot is
            // still stored for audit.
            None => warn!(store = STORE_NAME, product = %key, "book has an empty side, not notifying"),
        }
    }

    fn add_listener(&self, listener: Arc<dyn Listener<OrderBook>>) {
        self.listeners.write().push(listener);
    }

    fn listeners(&self) -> Vec<Arc<dyn Listener<OrderBook>>> {
        self.listeners.read().clone()
    }
}
