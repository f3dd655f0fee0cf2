//! Engine Notifications
//!
//! Every state-changing operation emits one event describing what
//! happened. Collaborators subscribe by providing an [`EventSink`];
//! the engine never depends on a sink succeeding.

use crate::types::{AssetKind, DateKey, MonthKey, SettleKey, UniqueId};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Notification contract exposed to collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum EngineEvent {
    /// A new asset value request slot was allocated
    RequestRegistered {
        kind: AssetKind,
        request_id: u64,
    },
    /// The oracle submitted a price for a date
    AssetValueReceived {
        kind: AssetKind,
        date: DateKey,
        price: u64,
    },
    /// A producer self-reported production
    ProductionRecorded {
        kind: AssetKind,
        unique_id: UniqueId,
        month: MonthKey,
        date: DateKey,
        volume: u64,
    },
    /// The oracle submitted ground-truth data for a settlement key
    TrustedDataReceived {
        kind: AssetKind,
        unique_id: UniqueId,
        key: SettleKey,
        amount: u128,
    },
    /// Reconciled settlement verified a period's volume
    VerifiedProduction {
        unique_id: UniqueId,
        key: SettleKey,
        corrected_volume: u64,
    },
    /// A settlement minted reward tokens
    ClearingReward {
        kind: AssetKind,
        unique_id: UniqueId,
        key: SettleKey,
        amount: u128,
    },
}

/// Event delivery seam. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// In-memory sink that records every event, for tests and embedding.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<EngineEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events emitted so far
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().expect("event log poisoned").clone()
    }

    /// Drain and return all recorded events
    pub fn take(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.lock().expect("event log poisoned"))
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("event log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().expect("event log poisoned").push(event);
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: EngineEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        log.emit(EngineEvent::RequestRegistered {
            kind: AssetKind::Gas,
            request_id: 1,
        });
        log.emit(EngineEvent::RequestRegistered {
            kind: AssetKind::Gas,
            request_id: 2,
        });

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            EngineEvent::RequestRegistered { request_id: 1, .. }
        ));

        let drained = log.take();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = EngineEvent::RequestRegistered {
            kind: AssetKind::Oil,
            request_id: 7,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "request_registered");
        assert_eq!(json["kind"], "OIL");
    }
}
