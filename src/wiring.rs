// Wires the two listener chains at startup:
//   price feed -> price store -> quote engine -> quote store -> sink
//   market feed -> book store -> execution engine -> execution store -> sink
// Chains never hold a direct reference to each other or to downstream
// collaborators; everything couples through Listener / OutboundAdapter.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{ExecutionEngine, ExecutionOrder, Quote, QuoteEngine};
use crate::fabric::{Keyed, KeyedStore, Listener, OutboundAdapter, Store};
use crate::market_data::{MarketDataStore, OrderBook};
use crate::pricing::ReferencePrice;

/// Listener bridging a store to an outbound sink: every accepted value is
/// pushed to the adapter. The store itself never publishes.
pub struct PublishOnAdd<V> {
    sink: Arc<dyn OutboundAdapter<V>>,
}

impl<V> PublishOnAdd<V> {
    pub fn new(sink: Arc<dyn OutboundAdapter<V>>) -> Arc<Self> {
        Arc::new(Self { sink })
    }
}

impl<V: Keyed + Send + Sync> Listener<V> for PublishOnAdd<V> {
    fn on_add(&self, v: &V) {
        self.sink.publish(v);
    }
}

// Runs the quote engine off reference price events and pushes each emitted
// quote into the quote store.
struct QuoteChain {
    engine: Mutex<QuoteEngine>,
    out: Arc<dyn Store<Quote>>,
}

impl Listener<ReferencePrice> for QuoteChain {
    fn on_add(&self, price: &ReferencePrice) {
        if let Some(quote) = self.engine.lock().on_price(price) {
            self.out.on_message(quote);
        }
    }
}

// Runs the execution engine off best-of-book events and pushes each decision
// into the execution store.
struct ExecutionChain {
    engine: Mutex<ExecutionEngine>,
    out: Arc<dyn Store<ExecutionOrder>>,
}

impl Listener<OrderBook> for ExecutionChain {
    fn on_add(&self, book: &OrderBook) {
        if let Some(order) = self.engine.lock().on_book(book) {
            self.out.on_message(order);
        }
    }
}

/// The assembled desk: the four stores, chains registered. Feed adapters
/// push into `prices` and `market_data`; everything downstream follows from
/// listener notification.
pub struct Desk {
    pub prices: Arc<KeyedStore<ReferencePrice>>,
    pub market_data: Arc<MarketDataStore>,
    pub quotes: Arc<KeyedStore<Quote>>,
    pub executions: Arc<KeyedStore<ExecutionOrder>>,
}

impl Desk {
    pub fn wire(
        quote_engine: QuoteEngine,
        execution_engine: ExecutionEngine,
        quote_sink: Arc<dyn OutboundAdapter<Quote>>,
        execution_sink: Arc<dyn OutboundAdapter<ExecutionOrder>>,
    ) -> Self {
        let prices = Arc::new(KeyedStore::new("reference-prices"));
        let market_data = Arc::new(MarketDataStore::new());
        let quotes: Arc<KeyedStore<Quote>> = Arc::new(KeyedStore::new("quotes"));
        let executions: Arc<KeyedStore<ExecutionOrder>> = Arc::new(KeyedStore::new("executions"));

        prices.add_listener(Arc::new(QuoteChain {
            engine: Mutex::new(quote_engine),
            out: quotes.clone(),
        }));
        quotes.add_listener(PublishOnAdd::new(quote_sink));

        market_data.add_listener(Arc::new(ExecutionChain {
            engine: Mutex::new(execution_engine),
            out: executions.clone(),
        }));
        executions.add_listener(PublishOnAdd::new(execution_sink));

        Self { prices, market_data, quotes, executions }
    }
}
