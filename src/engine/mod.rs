// Decision engines on top of the data stores
pub mod execution; // best-of-book -> take/no-take decision
pub mod quoting;   // reference price -> two-sided quote

pub use execution::{
    AlternatingSides, ExecutionEngine, ExecutionOrder, OrderIdAllocator, OrderType, SeededSides,
    SidePolicy, TAKE_THRESHOLD,
};
pub use quoting::{
    CyclingLots, LotPolicy, Quote, QuoteEngine, QuoteOrder, SeededLots, DEFAULT_LOTS, TIGHT_SPREAD,
};
