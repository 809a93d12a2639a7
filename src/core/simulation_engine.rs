use super::config::LineConfig;
use super::entity::Entity;
use super::errors::AssemblyError;
use super::event::{EventKind, LineEvent};
use super::event_scheduler::EventScheduler;
use super::monitor::Monitor;
use super::sink::Sink;
use super::station::{Admission, Station};
use super::types::{SimTime, StationId};
use log::debug;

/// Discrete-event model of one line: a chain of stations ending in a sink.
///
/// Stations live in an arena indexed by `StationId`; the next station is always
/// `index + 1` and the last one hands off to the sink. All waiting is expressed as
/// scheduled `LineEvent`s. A blocked hand-off is retried when the downstream
/// station frees a slot, never by polling.
pub struct SimulationEngine {
    scheduler: EventScheduler<LineEvent>,
    stations: Vec<Station>,
    sink: Sink,
    monitor: Monitor,
    events_processed: u64,
}

impl SimulationEngine {
    pub const SOURCE: &'static str = "Source";

    /// Build a fresh line at time zero
    pub fn new(config: &LineConfig) -> Result<Self, AssemblyError> {
        config.validate()?;
        let stations = (0..config.num_stations)
            .map(|i| Station::new(StationId(i), config.station_servers, config.station_buffer_capacity))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            scheduler: EventScheduler::new(),
            stations,
            sink: Sink::new(),
            monitor: Monitor::new(),
            events_processed: 0,
        })
    }

    /// Get current simulation time
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Check if there are pending events in the scheduler
    pub fn has_pending_events(&self) -> bool {
        self.scheduler.has_events()
    }

    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.scheduler.peek_next_time()
    }

    /// Blocks admitted to the line that have not reached the sink
    pub fn work_in_progress(&self) -> u64 {
        let admitted = self.stations.first().map_or(0, Station::parts_received);
        admitted - self.sink.parts_received()
    }

    /// Offer a block to the first station at the current time.
    ///
    /// Returns the block back if the first station is full.
    pub fn inject(&mut self, mut entity: Entity) -> Result<Option<Entity>, AssemblyError> {
        let now = self.now();
        entity.reset_progress();
        entity.mark_admitted(now);
        self.monitor.record(now, Self::SOURCE, entity.id(), EventKind::PartCreated)?;

        let entity_id = entity.id().clone();
        match self.stations[0].admit(entity, now, &mut self.monitor)? {
            Admission::Started { slot, duration } => self.schedule_completion(StationId(0), slot, duration)?,
            Admission::Queued => {}
            Admission::Refused(entity) => return Ok(Some(entity)),
        }
        self.monitor.record(now, Self::SOURCE, &entity_id, EventKind::PartTransferred)?;
        Ok(None)
    }

    /// Fire the next pending event, returns false if the timeline was empty
    pub fn step(&mut self) -> Result<bool, AssemblyError> {
        let Some((time, event)) = self.scheduler.pop_next()? else {
            return Ok(false);
        };
        self.events_processed += 1;

        match event {
            LineEvent::ServiceComplete { station, slot } => {
                debug!("[{}] t={:.3} service complete on slot {}", station, time, slot);
                self.stations[station.index()].finish_service(slot, time, &mut self.monitor)?;
                self.try_hand_off(station, slot, true)?;
            }
        }
        Ok(true)
    }

    /// Fire events until `predicate` holds.
    ///
    /// Running out of events before the predicate holds means the line is stuck,
    /// which is an invariant violation.
    pub fn run_until<F>(&mut self, mut predicate: F) -> Result<(), AssemblyError>
    where
        F: FnMut(&Self) -> bool,
    {
        while !predicate(self) {
            if !self.step()? {
                return Err(AssemblyError::invariant(format!(
                    "timeline exhausted at t={} before the stop condition held",
                    self.now()
                )));
            }
        }
        Ok(())
    }

    /// Fire every event due at the current instant, including zero-delay events
    /// scheduled while doing so
    pub fn drain_current_instant(&mut self) -> Result<(), AssemblyError> {
        while self.scheduler.peek_next_time() == Some(self.now()) {
            self.step()?;
        }
        Ok(())
    }

    /// Run the complete simulation, returns final time
    pub fn run(&mut self) -> Result<SimTime, AssemblyError> {
        while self.step()? {}
        Ok(self.now())
    }

    fn schedule_completion(&mut self, station: StationId, slot: usize, duration: SimTime) -> Result<(), AssemblyError> {
        self.scheduler.schedule_in(duration, LineEvent::ServiceComplete { station, slot })
    }

    /// Push the finished block on `slot` downstream.
    ///
    /// On success the slot is freed, the next buffered block starts, and blocked
    /// slots of the upstream station get another chance. Returns whether the
    /// hand-off happened. `first_attempt` is set right after service ends and
    /// cleared for retries of an already blocked slot.
    fn try_hand_off(&mut self, station: StationId, slot: usize, first_attempt: bool) -> Result<bool, AssemblyError> {
        let k = station.index();
        let Some((entity, since)) = self.stations[k].take_blocked(slot)? else {
            return Ok(false);
        };
        let now = self.now();
        let entity_id = entity.id().clone();

        match station.next(self.stations.len()) {
            None => self.sink.arrive(entity, now, &mut self.monitor)?,
            Some(next) => match self.stations[next.index()].admit(entity, now, &mut self.monitor)? {
                Admission::Started { slot: next_slot, duration } => {
                    self.schedule_completion(next, next_slot, duration)?
                }
                Admission::Queued => {}
                Admission::Refused(entity) => {
                    debug!("[{}] Block {} waits for {} to free a slot", station, entity_id, next);
                    self.stations[k].keep_blocked(slot, entity, since, first_attempt, now, &mut self.monitor)?;
                    return Ok(false);
                }
            },
        }

        if let Some(duration) = self.stations[k].release(slot, &entity_id, now, &mut self.monitor)? {
            self.schedule_completion(station, slot, duration)?;
        }
        if let Some(upstream) = station.previous() {
            self.retry_blocked(upstream)?;
        }
        Ok(true)
    }

    /// Retry the blocked slots of `station` after its downstream freed space
    fn retry_blocked(&mut self, station: StationId) -> Result<(), AssemblyError> {
        for slot in self.stations[station.index()].blocked_slots() {
            if !self.try_hand_off(station, slot, false)? {
                break;
            }
        }
        Ok(())
    }
}
