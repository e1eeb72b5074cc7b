//! Bounded in-process log capture.
//!
//! [`LogCollector`] is a `tracing` layer that keeps the most recent events in
//! a ring buffer; `GET /logs` reads it through a [`LogReader`]. Entries carry
//! a sequence number so a client polling the endpoint can tell which entries
//! it has already seen after older ones were evicted.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::unix_timestamp;

/// One captured event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in capture order, starting at 0. Never reused.
    pub seq: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    /// `ERROR`, `WARN`, `INFO`, `DEBUG` or `TRACE`.
    pub level: String,
    pub target: String,
    pub message: String,
    /// Structured fields other than `message`, rendered with `Debug`
    /// unless recorded as strings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl LogEntry {
    /// Parsed level; `None` only for entries deserialized from elsewhere.
    pub fn level(&self) -> Option<Level> {
        self.level.parse().ok()
    }

    /// `message k=v k=v`, the form the CLI prints.
    pub fn render(&self) -> String {
        let mut line = self.message.clone();
        for (key, value) in &self.fields {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }
}

#[derive(Debug)]
struct Ring {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_seq: u64,
}

impl Ring {
    fn record(&mut self, mut entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        entry.seq = self.next_seq;
        self.next_seq += 1;
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

type SharedRing = Arc<Mutex<Ring>>;

/// `tracing` layer feeding the ring buffer. A capacity of 0 records nothing.
#[derive(Debug, Clone)]
pub struct LogCollector {
    ring: SharedRing,
}

impl LogCollector {
    pub fn new(capacity: usize) -> Self {
        let ring = Ring {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
        };
        Self {
            ring: Arc::new(Mutex::new(ring)),
        }
    }

    pub fn reader(&self) -> LogReader {
        LogReader {
            ring: Arc::clone(&self.ring),
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let entry = LogEntry {
            seq: 0,
            timestamp: unix_timestamp(),
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message: fields.message,
            fields: fields.rest,
        };
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(entry);
    }
}

/// Read side of a [`LogCollector`].
#[derive(Debug, Clone)]
pub struct LogReader {
    ring: SharedRing,
}

impl LogReader {
    fn with_ring<T>(&self, f: impl FnOnce(&Ring) -> T) -> T {
        f(&self.ring.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Everything currently buffered, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.with_ring(|ring| ring.entries.iter().cloned().collect())
    }

    /// The newest `limit` entries at least as severe as `min_level`, oldest first.
    pub fn tail(&self, limit: usize, min_level: Option<Level>) -> Vec<LogEntry> {
        self.with_ring(|ring| {
            // `Level` orders ERROR lowest, so "at least as severe" is `<=`.
            let mut picked: Vec<LogEntry> = ring
                .entries
                .iter()
                .rev()
                .filter(|e| match min_level {
                    Some(min) => e.level().is_some_and(|l| l <= min),
                    None => true,
                })
                .take(limit)
                .cloned()
                .collect();
            picked.reverse();
            picked
        })
    }

    /// Entries captured after `seq`, oldest first.
    pub fn since(&self, seq: u64) -> Vec<LogEntry> {
        self.with_ring(|ring| {
            ring.entries
                .iter()
                .filter(|e| e.seq > seq)
                .cloned()
                .collect()
        })
    }

    pub fn len(&self) -> usize {
        self.with_ring(|ring| ring.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    rest: BTreeMap<String, String>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.rest.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }
}
