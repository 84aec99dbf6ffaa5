use thiserror::Error;

/// Failure taxonomy for the desk. Nothing in here is fatal: adapters drop
/// malformed records and keep reading, engines log a mismatch and ignore the
/// event, and lookup misses propagate to the caller untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeskError {
    /// Store lookup miss. Callers create-on-miss explicitly; the store never
    /// conjures a default value.
    #[error("no entry for key {key} in {store}")]
    NotFound { store: &'static str, key: String },

    /// No order book / catalog entry for the product id.
    #[error("unknown product {0}")]
    UnknownProduct(String),

    /// An inbound record that failed to decode. The record is skipped,
    /// ingestion continues.
    #[error("malformed record {line:?}: {reason}")]
    MalformedRecord { line: String, reason: String },

    /// Engine state keyed on one product received an event for another.
    /// Logged and ignored, never propagated.
    #[error("state for {expected} received event for {got}")]
    StateMismatch { expected: String, got: String },

    /// The feed source itself failed mid-read. Adapters stop draining.
    #[error("feed read failed: {0}")]
    Io(String),
}

pub type DeskResult<T> = Result<T, DeskError>;
