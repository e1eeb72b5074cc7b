//! Per-request status events.
//!
//! Each chat request gets its own [`StatusLog`]; events are returned with the
//! response and mirrored to the tracing log.

use serde::{Deserialize, Serialize};
use tracing::info;

/// A timestamped step in handling one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Unix seconds.
    pub timestamp: f64,
    pub message: String,
}

/// Ordered events for a single request. Never shared between requests.
#[derive(Debug, Default)]
pub struct StatusLog {
    events: Vec<StatusEvent>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "switchboard::status", "{message}");
        self.events.push(StatusEvent {
            timestamp: crate::unix_timestamp(),
            message,
        });
    }

    pub fn events(&self) -> &[StatusEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<StatusEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_ordered() {
        let mut log = StatusLog::new();
        log.emit("first");
        log.emit(String::from("second"));
        let events = log.into_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "first");
        assert!(events[0].timestamp <= events[1].timestamp);
    }
}
