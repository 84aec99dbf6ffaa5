// Order book market data
pub mod book;    // order/book/bid-offer values + depth projections
pub mod feed;    // line-decoding inbound adapter assembling snapshots
pub mod service; // the order book store (best-of-book fan-out)

pub use book::{BidOffer, Order, OrderBook, Side};
pub use feed::MarketDataFeed;
pub use service::MarketDataStore;
