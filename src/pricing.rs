use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::errors::{DeskError, DeskResult};
use crate::fabric::{InboundAdapter, Keyed, Store};
use crate::products::ProductCatalog;
use crate::ticks;

/// Reference mid price with the bid/offer spread around it. One logical
/// latest value per product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePrice {
    pub product_id: String,
    pub mid: f64,
    pub spread: f64,
}

impl Keyed for ReferencePrice {
    fn key(&self) -> &str {
        &self.product_id
    }
}

/// Decode one `code,price,spread` reference price record. Both price and
/// spread are 32nds text.
pub fn decode_price(line: &str, catalog: &ProductCatalog) -> DeskResult<ReferencePrice> {
    let malformed = |reason: &str| DeskError::MalformedRecord {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 3 {
        return Err(malformed("expected code,price,spread"));
    }
    let cusip = fields[0];
    if !catalog.contains(cusip) {
        return Err(DeskError::UnknownProduct(cusip.to_string()));
    }
    Ok(ReferencePrice {
        product_id: cusip.to_string(),
        mid: ticks::parse_px(fields[1])?,
        spread: ticks::parse_px(fields[2])?,
    })
}

/// Inbound adapter for the reference price stream: one record per line,
/// pushed straight into the price store. Malformed records are logged and
/// skipped; the stream never aborts.
pub struct PriceFeed<R> {
    reader: BufReader<R>,
    store: Arc<dyn Store<ReferencePrice>>,
    catalog: Arc<ProductCatalog>,
}

impl<R: tokio::io::AsyncRead + Unpin + Send> PriceFeed<R> {
    pub fn new(
        source: R,
        store: Arc<dyn Store<ReferencePrice>>,
        catalog: Arc<ProductCatalog>,
    ) -> Self {
        Self { reader: BufReader::new(source), store, catalog }
    }
}

#[async_trait]
impl<R: tokio::io::AsyncRead + Unpin + Send> InboundAdapter for PriceFeed<R> {
    async fn subscribe(&mut self) -> DeskResult<u64> {
        let mut accepted = 0u64;
        let mut lines = (&mut self.reader).lines();
        while let Some(line) =
            lines.next_line().await.map_err(|e| DeskError::Io(e.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            match decode_price(&line, &self.catalog) {
                Ok(price) => {
                    self.store.on_message(price);
                    accepted += 1;
                }
                Err(e) => warn!(error = %e, "dropping price record"),
            }
        }
        info!(records = accepted, "price stream drained");
        Ok(accepted)
    }
}
