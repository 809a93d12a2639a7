use super::types::{EntityId, SimTime, StationId};
use serde::{Deserialize, Serialize};

/// Payload carried by the scheduler for the production line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    /// A service slot at `station` finishes its current block
    ServiceComplete { station: StationId, slot: usize },
}

/// Kind of a monitor record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PartCreated,
    PartTransferred,
    Queued,
    ServiceStarted,
    ServiceFinished,
    Blocked,
    HandedOff,
    Completed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PartCreated => "part_created",
            EventKind::PartTransferred => "part_transferred",
            EventKind::Queued => "queued",
            EventKind::ServiceStarted => "work_start",
            EventKind::ServiceFinished => "work_finish",
            EventKind::Blocked => "blocked",
            EventKind::HandedOff => "handed_off",
            EventKind::Completed => "completed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the event log: `{timestamp, station_name, entity_id, event_kind}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: SimTime,
    pub station: String,
    pub entity_id: EntityId,
    pub kind: EventKind,
}
