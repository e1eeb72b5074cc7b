//! Bounded record of processed requests and their responses.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of entries retained per engine.
pub const HISTORY_CAPACITY: usize = 100;

/// One processed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unix seconds at which the request finished processing.
    pub timestamp: f64,
    /// The request as received. Unparseable input is kept as raw text.
    pub request: Value,
    /// The response, absent for notifications.
    pub response: Option<Value>,
}

/// Oldest-first ring buffer of [`HistoryEntry`] values.
#[derive(Debug)]
pub struct History {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest once capacity is exceeded.
    pub fn record(&self, request: Value, response: Option<Value>) {
        let entry = HistoryEntry {
            timestamp: crate::unix_timestamp(),
            request,
            response,
        };
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Copy of all entries, oldest first.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_and_snapshot() {
        let history = History::default();
        history.record(json!({"method": "a"}), Some(json!({"result": 1})));
        history.record(json!({"method": "b"}), None);

        let entries = history.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].request["method"], "a");
        assert!(entries[1].response.is_none());
    }

    #[test]
    fn test_evicts_oldest() {
        let history = History::new(3);
        for i in 0..5 {
            history.record(json!(i), None);
        }
        let requests: Vec<_> = history.snapshot().into_iter().map(|e| e.request).collect();
        assert_eq!(requests, vec![json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn test_default_capacity() {
        let history = History::default();
        for i in 0..(HISTORY_CAPACITY + 20) {
            history.record(json!(i), None);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.snapshot()[0].request, json!(20));
    }
}
