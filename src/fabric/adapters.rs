use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::errors::DeskResult;

/// Boundary from the outside world into a store: reads an external source and
/// pushes one decoded value at a time through `Store::on_message`. No reverse
/// flow. Undecodable records are logged and skipped; the stream keeps going.
#[async_trait]
pub trait InboundAdapter: Send {
    /// Drain the source. Returns the number of accepted records.
    async fn subscribe(&mut self) -> DeskResult<u64>;
}

/// Boundary out of the desk: a component pushes explicitly, the store never
/// publishes on its own. The core does not care whether the sink is a screen,
/// a log file or a booking collaborator.
pub trait OutboundAdapter<V>: Send + Sync {
    fn publish(&self, v: &V);
}

/// Publishes snapshots into the log stream. The console/GUI stand-in.
pub struct TracingSink {
    label: &'static str,
}

impl TracingSink {
    pub fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self { label })
    }
}

impl<V: std::fmt::Debug> OutboundAdapter<V> for TracingSink {
    fn publish(&self, v: &V) {
        info!(sink = self.label, value = ?v, "publish");
    }
}

/// Publishes one JSON object per line to any writer. The historical-data
/// stand-in; point it at a file to keep a terminal record of a chain.
pub struct JsonlSink<W: Write + Send> {
    label: &'static str,
    out: Mutex<W>,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(label: &'static str, out: W) -> Arc<Self> {
        Arc::new(Self { label, out: Mutex::new(out) })
    }
}

impl<V: Serialize, W: Write + Send> OutboundAdapter<V> for JsonlSink<W> {
    fn publish(&self, v: &V) {
        match serde_json::to_string(v) {
            Ok(line) => {
                let mut out = self.out.lock();
                if let Err(e) = writeln!(out, "{line}") {
                    tracing::warn!(sink = self.label, error = %e, "jsonl write failed");
                }
            }
            Err(e) => tracing::warn!(sink = self.label, error = %e, "jsonl encode failed"),
        }
    }
}

/// Collects published values in memory. Used by tests and as the stub for
/// external collaborators (trade booking receives execution orders here).
pub struct MemorySink<V> {
    values: Mutex<Vec<V>>,
}

impl<V: Clone> MemorySink<V> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { values: Mutex::new(Vec::new()) })
    }

    pub fn values(&self) -> Vec<V> {
        self.values.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl<V: Clone + Send + Sync> OutboundAdapter<V> for MemorySink<V> {
    fn publish(&self, v: &V) {
        self.values.lock().push(v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.publish(&1);
        sink.publish(&2);
        assert_eq!(sink.values(), vec![1, 2]);
    }

    #[test]
    fn jsonl_sink_writes_one_line_per_value() {
        let buf: Vec<u8> = Vec::new();
        let sink = JsonlSink::new("test", buf);
        sink.publish(&serde_json::json!({"px": 99.5}));
        sink.publish(&serde_json::json!({"px": 100.0}));
        let written = String::from_utf8(sink.out.lock().clone()).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.lines().next().unwrap().contains("99.5"));
    }
}
