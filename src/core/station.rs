use super::entity::Entity;
use super::errors::AssemblyError;
use super::event::EventKind;
use super::monitor::Monitor;
use super::types::{SimTime, StationId};
use log::debug;
use std::collections::VecDeque;

/// State of one service slot.
///
/// `Idle -> Serving -> Blocked -> Idle`. A slot enters `Blocked` as soon as
/// service ends and stays there until the downstream stage admits the block.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Idle,
    Serving(Entity),
    Blocked { entity: Entity, since: SimTime },
}

impl Slot {
    pub fn is_idle(&self) -> bool {
        matches!(self, Slot::Idle)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Slot::Blocked { .. })
    }
}

/// Outcome of offering a block to a station
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Service started immediately on `slot`; completion is due after `duration`
    Started { slot: usize, duration: SimTime },
    /// Waiting in the FIFO buffer for a free slot
    Queued,
    /// Buffer and slots are full, the block goes back to the caller
    Refused(Entity),
}

/// A processing stage with `slots.len()` servers and a bounded FIFO buffer
#[derive(Debug, Clone)]
pub struct Station {
    id: StationId,
    name: String,
    buffer_capacity: usize,
    buffer: VecDeque<Entity>,
    slots: Vec<Slot>,
    parts_received: u64,
    parts_sent: u64,
}

impl Station {
    pub fn new(id: StationId, servers: usize, buffer_capacity: usize) -> Result<Self, AssemblyError> {
        if servers == 0 {
            return Err(AssemblyError::Configuration(format!("{} needs at least one server", id)));
        }
        Ok(Self {
            id,
            name: id.to_string(),
            buffer_capacity,
            buffer: VecDeque::with_capacity(buffer_capacity),
            slots: vec![Slot::Idle; servers],
            parts_received: 0,
            parts_sent: 0,
        })
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parts_received(&self) -> u64 {
        self.parts_received
    }

    pub fn parts_sent(&self) -> u64 {
        self.parts_sent
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Blocks currently held by this station, queued or in a slot
    pub fn occupancy(&self) -> usize {
        self.buffer.len() + self.slots.iter().filter(|slot| !slot.is_idle()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }

    pub fn has_room(&self) -> bool {
        self.idle_slot().is_some() || self.buffer.len() < self.buffer_capacity
    }

    fn idle_slot(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_idle)
    }

    /// Offer a block to this station.
    ///
    /// A full station hands the block back as `Admission::Refused`; the caller keeps it.
    pub fn admit(&mut self, entity: Entity, at_time: SimTime, monitor: &mut Monitor) -> Result<Admission, AssemblyError> {
        if let Some(slot) = self.idle_slot() {
            if !self.buffer.is_empty() {
                return Err(AssemblyError::invariant(format!(
                    "{} has an idle slot while {} blocks wait in its buffer",
                    self.name,
                    self.buffer.len()
                )));
            }
            self.parts_received += 1;
            let duration = self.start_service(slot, entity, at_time, monitor)?;
            return Ok(Admission::Started { slot, duration });
        }

        if self.buffer.len() >= self.buffer_capacity {
            debug!("[{}] Refused block {} - station full ({} held)", self.name, entity.id(), self.occupancy());
            return Ok(Admission::Refused(entity));
        }

        monitor.record(at_time, &self.name, entity.id(), EventKind::Queued)?;
        self.parts_received += 1;
        self.buffer.push_back(entity);
        Ok(Admission::Queued)
    }

    fn start_service(
        &mut self,
        slot: usize,
        entity: Entity,
        at_time: SimTime,
        monitor: &mut Monitor,
    ) -> Result<SimTime, AssemblyError> {
        if entity.step() != self.id.index() {
            return Err(AssemblyError::invariant(format!(
                "block {} is at step {} but entered {}",
                entity.id(),
                entity.step(),
                self.name
            )));
        }
        let duration = entity.current_duration()?;
        monitor.record(at_time, &self.name, entity.id(), EventKind::ServiceStarted)?;
        self.slots[slot] = Slot::Serving(entity);
        Ok(duration)
    }

    /// Service on `slot` has ended: the block moves past this step and waits for hand-off
    pub fn finish_service(&mut self, slot: usize, at_time: SimTime, monitor: &mut Monitor) -> Result<(), AssemblyError> {
        let state = std::mem::replace(self.slot_mut(slot)?, Slot::Idle);
        let Slot::Serving(mut entity) = state else {
            return Err(AssemblyError::invariant(format!(
                "{} slot {} completed service while not serving",
                self.name, slot
            )));
        };
        entity.advance()?;
        monitor.record(at_time, &self.name, entity.id(), EventKind::ServiceFinished)?;
        self.slots[slot] = Slot::Blocked { entity, since: at_time };
        Ok(())
    }

    /// Slots holding a finished block, oldest completion first
    pub fn blocked_slots(&self) -> Vec<usize> {
        let mut blocked: Vec<(SimTime, usize)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Blocked { since, .. } => Some((*since, i)),
                _ => None,
            })
            .collect();
        blocked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        blocked.into_iter().map(|(_, i)| i).collect()
    }

    /// Take the finished block out of `slot` to offer it downstream.
    ///
    /// Must be followed by either `release` or `keep_blocked` for the same slot.
    pub fn take_blocked(&mut self, slot: usize) -> Result<Option<(Entity, SimTime)>, AssemblyError> {
        let slot_ref = self.slot_mut(slot)?;
        if !slot_ref.is_blocked() {
            return Ok(None);
        }
        match std::mem::replace(slot_ref, Slot::Idle) {
            Slot::Blocked { entity, since } => Ok(Some((entity, since))),
            _ => Ok(None),
        }
    }

    /// Downstream refused the block: it stays on `slot`, holding the station closed.
    ///
    /// Only the first refusal after service is a transition and gets a monitor record;
    /// a refused retry leaves the slot as it was.
    pub fn keep_blocked(
        &mut self,
        slot: usize,
        entity: Entity,
        since: SimTime,
        first_refusal: bool,
        at_time: SimTime,
        monitor: &mut Monitor,
    ) -> Result<(), AssemblyError> {
        if first_refusal {
            monitor.record(at_time, &self.name, entity.id(), EventKind::Blocked)?;
        }
        *self.slot_mut(slot)? = Slot::Blocked { entity, since };
        Ok(())
    }

    /// Downstream accepted the block taken from `slot`.
    ///
    /// Frees the slot and starts the next buffered block on it, returning the
    /// service duration that must be scheduled.
    pub fn release(
        &mut self,
        slot: usize,
        entity_id: &str,
        at_time: SimTime,
        monitor: &mut Monitor,
    ) -> Result<Option<SimTime>, AssemblyError> {
        if !self.slot_mut(slot)?.is_idle() {
            return Err(AssemblyError::invariant(format!(
                "{} released slot {} which still holds a block",
                self.name, slot
            )));
        }
        self.parts_sent += 1;
        monitor.record(at_time, &self.name, entity_id, EventKind::HandedOff)?;

        match self.buffer.pop_front() {
            Some(next) => Ok(Some(self.start_service(slot, next, at_time, monitor)?)),
            None => Ok(None),
        }
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Slot, AssemblyError> {
        let name = &self.name;
        let servers = self.slots.len();
        self.slots
            .get_mut(slot)
            .ok_or_else(|| AssemblyError::invariant(format!("{} has no slot {} (servers: {})", name, slot, servers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str) -> Entity {
        Entity::new(id, vec![2.0, 1.0])
    }

    #[test]
    fn test_single_server_without_buffer_refuses_second_block() {
        let mut station = Station::new(StationId(0), 1, 0).unwrap();
        let mut monitor = Monitor::new();

        let first = station.admit(block("A"), 0.0, &mut monitor).unwrap();
        assert_eq!(first, Admission::Started { slot: 0, duration: 2.0 });

        let second = station.admit(block("B"), 0.0, &mut monitor).unwrap();
        assert!(matches!(second, Admission::Refused(ref e) if e.id() == "B"));
        assert_eq!(station.parts_received(), 1);
    }

    #[test]
    fn test_buffer_feeds_slot_on_release() {
        let mut station = Station::new(StationId(0), 1, 1).unwrap();
        let mut monitor = Monitor::new();

        station.admit(block("A"), 0.0, &mut monitor).unwrap();
        assert_eq!(station.admit(block("B"), 0.0, &mut monitor).unwrap(), Admission::Queued);
        assert!(!station.has_room());

        station.finish_service(0, 2.0, &mut monitor).unwrap();
        assert_eq!(station.blocked_slots(), vec![0]);

        let (entity, _) = station.take_blocked(0).unwrap().unwrap();
        assert_eq!(entity.step(), 1);
        let next = station.release(0, entity.id(), 2.0, &mut monitor).unwrap();
        assert_eq!(next, Some(2.0));
        assert_eq!(station.parts_sent(), 1);
        assert_eq!(station.buffer_len(), 0);
        assert!(matches!(&station.slots()[0], Slot::Serving(e) if e.id() == "B"));
    }

    #[test]
    fn test_refused_hand_off_keeps_slot_blocked() {
        let mut station = Station::new(StationId(0), 1, 0).unwrap();
        let mut monitor = Monitor::new();
        station.admit(block("A"), 0.0, &mut monitor).unwrap();
        station.finish_service(0, 2.0, &mut monitor).unwrap();

        let (entity, since) = station.take_blocked(0).unwrap().unwrap();
        station.keep_blocked(0, entity, since, true, 2.0, &mut monitor).unwrap();

        assert!(station.slots()[0].is_blocked());
        assert!(!station.has_room());
        assert_eq!(station.parts_sent(), 0);
        assert_eq!(monitor.count(EventKind::Blocked), 1);

        // A refused retry later on is not a new transition
        let (entity, since) = station.take_blocked(0).unwrap().unwrap();
        station.keep_blocked(0, entity, since, false, 5.0, &mut monitor).unwrap();
        assert!(matches!(&station.slots()[0], Slot::Blocked { since, .. } if *since == 2.0));
        assert_eq!(monitor.count(EventKind::Blocked), 1);
    }

    #[test]
    fn test_full_buffer_refuses_without_growing() {
        let mut station = Station::new(StationId(0), 1, 1).unwrap();
        let mut monitor = Monitor::new();
        station.admit(block("A"), 0.0, &mut monitor).unwrap();
        station.admit(block("B"), 0.0, &mut monitor).unwrap();

        let third = station.admit(block("C"), 0.0, &mut monitor).unwrap();
        assert!(matches!(third, Admission::Refused(ref e) if e.id() == "C"));
        assert_eq!(station.buffer_len(), station.buffer_capacity());
        assert_eq!(station.occupancy(), 2);
        assert_eq!(station.parts_received(), 2);
        assert_eq!(monitor.count(EventKind::Queued), 1);
    }

    #[test]
    fn test_finishing_an_idle_slot_is_an_invariant_violation() {
        let mut station = Station::new(StationId(0), 1, 1).unwrap();
        let mut monitor = Monitor::new();
        assert!(station.finish_service(0, 1.0, &mut monitor).unwrap_err().is_fatal());
        assert!(station.finish_service(3, 1.0, &mut monitor).unwrap_err().is_fatal());
    }

    #[test]
    fn test_zero_servers_is_a_configuration_error() {
        assert!(matches!(
            Station::new(StationId(1), 0, 1),
            Err(AssemblyError::Configuration(_))
        ));
    }
}
