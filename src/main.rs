use std::fs::File;
use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use fidesk_rs::config::Options;
use fidesk_rs::engine::{
    AlternatingSides, CyclingLots, ExecutionEngine, ExecutionOrder, OrderIdAllocator, Quote,
    QuoteEngine, SeededLots, SeededSides, DEFAULT_LOTS,
};
use fidesk_rs::fabric::{InboundAdapter, JsonlSink, OutboundAdapter, Store, TracingSink};
use fidesk_rs::market_data::{MarketDataFeed, OrderBook};
use fidesk_rs::pricing::{PriceFeed, ReferencePrice};
use fidesk_rs::products::ProductCatalog;
use fidesk_rs::wiring::Desk;
use fidesk_rs::{feedgen, telemetry};

fn quote_sink(opts: &Options) -> anyhow::Result<Arc<dyn OutboundAdapter<Quote>>> {
    Ok(match &opts.quotes_out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            JsonlSink::new("quotes", file)
        }
        None => TracingSink::new("quotes"),
    })
}

fn execution_sink(opts: &Options) -> anyhow::Result<Arc<dyn OutboundAdapter<ExecutionOrder>>> {
    Ok(match &opts.executions_out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            JsonlSink::new("executions", file)
        }
        None => TracingSink::new("executions"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let opts = Options::parse();
    telemetry::init_tracing(&opts.log);

    let catalog = Arc::new(ProductCatalog::on_the_run());
    info!(products = catalog.cusips().len(), seed = ?opts.seed, "desk starting");

    let quote_engine = match opts.seed {
        Some(seed) => QuoteEngine::new(Box::new(SeededLots::new(DEFAULT_LOTS.to_vec(), seed))),
        None => QuoteEngine::new(Box::new(CyclingLots::default())),
    };
    let execution_engine = match opts.seed {
        Some(seed) => {
            ExecutionEngine::new(Box::new(SeededSides::new(seed)), OrderIdAllocator::new("EXE"))
        }
        None => {
            ExecutionEngine::new(Box::new(AlternatingSides::new()), OrderIdAllocator::new("EXE"))
        }
    };

    let desk = Desk::wire(
        quote_engine,
        execution_engine,
        quote_sink(&opts)?,
        execution_sink(&opts)?,
    );

    // The two chains are independent; run their feeds as separate tasks.
    let price_text = feedgen::price_feed_text(&catalog, opts.price_rounds);
    let market_text = feedgen::market_feed_text(&catalog, opts.book_rounds);

    let price_task = {
        let store: Arc<dyn Store<ReferencePrice>> = desk.prices.clone();
        let catalog = catalog.clone();
        tokio::spawn(async move {
            PriceFeed::new(Cursor::new(price_text), store, catalog).subscribe().await
        })
    };
    let market_task = {
        let store: Arc<dyn Store<OrderBook>> = desk.market_data.clone();
        let catalog = catalog.clone();
        tokio::spawn(async move {
            MarketDataFeed::new(Cursor::new(market_text), store, catalog).subscribe().await
        })
    };

    let prices_accepted = price_task.await??;
    let books_accepted = market_task.await??;
    info!(prices_accepted, market_records_accepted = books_accepted, "feeds drained");

    // Desk state after the run: last quote, last decision, current book.
    for cusip in catalog.cusips() {
        if let Ok(quote) = desk.quotes.get(cusip) {
            info!(
                product = cusip,
                bid = quote.bid.price,
                offer = quote.offer.price,
                visible = quote.bid.visible_quantity,
                "last quote"
            );
        }
        if let Ok(order) = desk.executions.get(cusip) {
            info!(
                product = cusip,
                side = ?order.side,
                price = order.price,
                quantity = order.visible_quantity,
                order_id = %order.order_id,
                "last execution decision"
            );
        }
        if let Ok(best) = desk.market_data.best_bid_offer(cusip) {
            let depth = desk.market_data.aggregate_depth(cusip)?;
            info!(
                product = cusip,
                best_bid = best.bid.price,
                best_offer = best.offer.price,
                bid_levels = depth.bids.len(),
                offer_levels = depth.offers.len(),
                "book"
            );
        }
    }

    Ok(())
}
