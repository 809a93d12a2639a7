use super::entity::Entity;
use super::errors::AssemblyError;
use super::event::EventKind;
use super::monitor::Monitor;
use super::types::{EntityId, SimTime};
use serde::{Deserialize, Serialize};

/// Completion entry for one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrival {
    pub entity_id: EntityId,
    pub admitted_at: Option<SimTime>,
    pub arrived_at: SimTime,
}

impl Arrival {
    /// Time from admission at the first station to arrival here
    pub fn lead_time(&self) -> Option<SimTime> {
        self.admitted_at.map(|admitted| self.arrived_at - admitted)
    }
}

/// Terminal collector with unlimited capacity
#[derive(Debug, Clone, Default)]
pub struct Sink {
    parts_received: u64,
    last_arrival: SimTime,
    arrivals: Vec<Arrival>,
}

impl Sink {
    pub const NAME: &'static str = "Sink";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn arrive(&mut self, entity: Entity, at_time: SimTime, monitor: &mut Monitor) -> Result<(), AssemblyError> {
        if !entity.is_finished() {
            return Err(AssemblyError::invariant(format!(
                "block {} reached the sink at step {} of {}",
                entity.id(),
                entity.step(),
                entity.num_steps()
            )));
        }
        if let Some(previous) = self.arrivals.last() {
            if at_time < previous.arrived_at {
                return Err(AssemblyError::invariant(format!(
                    "sink arrival at {} precedes previous arrival at {}",
                    at_time, previous.arrived_at
                )));
            }
        }

        monitor.record(at_time, Self::NAME, entity.id(), EventKind::Completed)?;
        self.parts_received += 1;
        self.last_arrival = self.last_arrival.max(at_time);
        self.arrivals.push(Arrival {
            entity_id: entity.id().clone(),
            admitted_at: entity.admitted_at(),
            arrived_at: at_time,
        });
        Ok(())
    }

    pub fn parts_received(&self) -> u64 {
        self.parts_received
    }

    /// Realized lead time of the line: time of the latest completion
    pub fn last_arrival(&self) -> SimTime {
        self.last_arrival
    }

    pub fn arrivals(&self) -> &[Arrival] {
        &self.arrivals
    }

    /// Average admission-to-completion time over all completed blocks
    pub fn mean_lead_time(&self) -> Option<SimTime> {
        let lead_times: Vec<SimTime> = self.arrivals.iter().filter_map(Arrival::lead_time).collect();
        if lead_times.is_empty() {
            None
        } else {
            Some(lead_times.iter().sum::<SimTime>() / lead_times.len() as SimTime)
        }
    }
}
