use std::path::PathBuf;

use clap::Parser;

/// Demo desk options. Feeds are generated in-process; point the sinks at
/// files to keep a record of what each chain published.
#[derive(Parser, Debug)]
#[command(name = "fidesk", about = "Pub-sub fixed-income trading desk demo")]
pub struct Options {
    /// Reference price ticks per product
    #[arg(long, default_value_t = 12)]
    pub price_rounds: usize,

    /// Order book snapshots per product
    #[arg(long, default_value_t = 6)]
    pub book_rounds: usize,

    /// Seed for the randomized lot/side policies; the deterministic
    /// cycling/alternating policies are used when absent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write published quotes to this JSONL file (logged otherwise)
    #[arg(long)]
    pub quotes_out: Option<PathBuf>,

    /// Write published executions to this JSONL file (logged otherwise)
    #[arg(long)]
    pub executions_out: Option<PathBuf>,

    /// Default tracing filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log: String,
}
