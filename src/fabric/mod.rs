// Pub-sub fabric the desk is built on
pub mod store;    // keyed store + listener registry
pub mod adapters; // inbound/outbound boundary traits + bundled sinks

pub use adapters::{InboundAdapter, JsonlSink, MemorySink, OutboundAdapter, TracingSink};
pub use store::{Keyed, KeyedStore, Listener, Store};
