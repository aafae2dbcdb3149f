//! Observational telemetry
//!
//! Never required for correctness. Sinks may drop events freely.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::sim::Lane;

/// Telemetry event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    SpawnBatch {
        targets: usize,
        decoys: usize,
        pruned: usize,
        pool_size: usize,
        forced: bool,
    },
    Tap {
        correct: bool,
        latency_ms: u64,
        lane: Lane,
    },
    StateChange {
        level_index: usize,
        progress: u8,
        streak: u32,
        lap_count: u32,
        winner: bool,
    },
    EmojiAppearance {
        emoji: &'static str,
    },
    /// Forced target spawn went past the soft capacity
    CapacityOverrun {
        pool_size: usize,
        max: usize,
    },
    Error {
        kind: &'static str,
        message: String,
    },
}

/// Telemetry sink
pub trait TelemetrySink {
    fn record(&mut self, event: TelemetryEvent);
}

/// Drop all events
#[derive(Debug, Default)]
pub struct NullTelemetry;

impl TelemetrySink for NullTelemetry {
    fn record(&mut self, _event: TelemetryEvent) {}
}

/// Forward events to the log as JSON lines
#[derive(Debug, Default)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn record(&mut self, event: TelemetryEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => log::trace!(target: "telemetry", "{}", json),
            Err(err) => log::trace!(target: "telemetry", "{:?} ({})", event, err),
        }
    }
}

/// Keep every event in memory (tests, replay tooling). Clones share the
/// same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    events: Rc<RefCell<Vec<TelemetryEvent>>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.borrow().clone()
    }

    /// Count events matching `pred`
    pub fn count(&self, pred: impl Fn(&TelemetryEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    /// Whether an error of `kind` was reported
    pub fn has_error(&self, kind: &str) -> bool {
        self.count(|e| matches!(e, TelemetryEvent::Error { kind: k, .. } if *k == kind)) > 0
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record(&mut self, event: TelemetryEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_tagged() {
        let json = serde_json::to_string(&TelemetryEvent::Tap {
            correct: true,
            latency_ms: 1200,
            lane: Lane::Left,
        })
        .unwrap();
        assert!(json.contains(r#""event":"tap""#));
        assert!(json.contains(r#""latency_ms":1200"#));
    }
}
