use super::errors::AssemblyError;
use super::event::{EventKind, EventRecord};
use super::types::SimTime;
use log::trace;
use uuid::Uuid;

/// Append-only log of everything that happens on the line during one episode.
///
/// Not on the decision path; offline tooling reads it through `records()`.
#[derive(Debug, Clone)]
pub struct Monitor {
    run_id: Uuid,
    records: Vec<EventRecord>,
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            records: Vec::new(),
        }
    }

    /// Identifier shared by every record of this episode
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn record(
        &mut self,
        timestamp: SimTime,
        station: &str,
        entity_id: &str,
        kind: EventKind,
    ) -> Result<(), AssemblyError> {
        if let Some(last) = self.records.last() {
            if timestamp < last.timestamp {
                return Err(AssemblyError::invariant(format!(
                    "monitor record at {} precedes previous record at {}",
                    timestamp, last.timestamp
                )));
            }
        }

        trace!("[{}] t={:.3} {} {}", station, timestamp, kind, entity_id);
        self.records.push(EventRecord {
            timestamp,
            station: station.to_string(),
            entity_id: entity_id.to_string(),
            kind,
        });
        Ok(())
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records emitted by one station, in order
    pub fn records_for<'a>(&'a self, station: &'a str) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.records.iter().filter(move |r| r.station == station)
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_are_appended_in_order() {
        let mut monitor = Monitor::new();
        monitor.record(0.0, "Source", "A", EventKind::PartCreated).unwrap();
        monitor.record(0.0, "Station0", "A", EventKind::ServiceStarted).unwrap();
        monitor.record(2.0, "Station0", "A", EventKind::ServiceFinished).unwrap();

        assert_eq!(monitor.len(), 3);
        assert_eq!(monitor.records_for("Station0").count(), 2);
        assert_eq!(monitor.count(EventKind::PartCreated), 1);
        assert_eq!(monitor.records()[2].timestamp, 2.0);
    }

    #[test]
    fn test_backward_timestamp_is_rejected() {
        let mut monitor = Monitor::new();
        monitor.record(3.0, "Station1", "A", EventKind::HandedOff).unwrap();
        let err = monitor.record(1.0, "Station1", "B", EventKind::Queued).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(monitor.len(), 1);
    }

    #[test]
    fn test_each_monitor_has_its_own_run_id() {
        assert_ne!(Monitor::new().run_id(), Monitor::new().run_id());
    }
}
