// A simplified fixed-income trading desk: independent keyed stores joined by
// a publish/subscribe fabric, with a quote-streaming engine and an
// order-execution engine sitting on top of the data.

pub mod config;      // demo binary options
pub mod engine;      // quote + execution decision engines
pub mod errors;      // desk failure taxonomy
pub mod fabric;      // keyed stores, listeners, boundary adapters
pub mod feedgen;     // deterministic demo feeds
pub mod market_data; // order book model + store
pub mod pricing;     // reference prices + feed
pub mod products;    // treasury reference catalog
pub mod telemetry;   // tracing init
pub mod ticks;       // 32nds price text
pub mod wiring;      // chain assembly
