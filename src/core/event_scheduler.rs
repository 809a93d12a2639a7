use super::errors::AssemblyError;
use super::types::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
pub struct ScheduledEvent<E> {
    pub time: SimTime,
    pub sequence_num: u64,
    pub event: E,
}

impl<E> PartialEq for ScheduledEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time.total_cmp(&other.time) == Ordering::Equal && self.sequence_num == other.sequence_num
    }
}

impl<E> Eq for ScheduledEvent<E> {}

impl<E> PartialOrd for ScheduledEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for ScheduledEvent<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Timeline of pending events ordered by `(time, insertion sequence)`.
///
/// Events at the same timestamp fire in the order they were scheduled. Time only
/// moves forward; nothing is ever cancelled.
pub struct EventScheduler<E> {
    event_queue: BinaryHeap<ScheduledEvent<E>>,
    sequence_counter: u64,
    now: SimTime,
}

impl<E> EventScheduler<E> {
    /// Create a new EventScheduler at time zero
    pub fn new() -> Self {
        Self {
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
            now: 0.0,
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule an event at an absolute time
    pub fn schedule_at(&mut self, time: SimTime, event: E) -> Result<(), AssemblyError> {
        if !time.is_finite() {
            return Err(AssemblyError::invariant(format!(
                "cannot schedule an event at non-finite time {}",
                time
            )));
        }
        if time < self.now {
            return Err(AssemblyError::invariant(format!(
                "event scheduled at {} is earlier than current time {}",
                time, self.now
            )));
        }

        self.event_queue.push(ScheduledEvent {
            time,
            sequence_num: self.sequence_counter,
            event,
        });
        self.sequence_counter += 1;
        Ok(())
    }

    /// Schedule an event `delay` time units from now
    pub fn schedule_in(&mut self, delay: SimTime, event: E) -> Result<(), AssemblyError> {
        if delay < 0.0 {
            return Err(AssemblyError::invariant(format!("negative delay {}", delay)));
        }
        self.schedule_at(self.now + delay, event)
    }

    /// Remove the earliest event and advance the clock to its time
    pub fn pop_next(&mut self) -> Result<Option<(SimTime, E)>, AssemblyError> {
        let Some(scheduled) = self.event_queue.pop() else {
            return Ok(None);
        };
        if scheduled.time < self.now {
            return Err(AssemblyError::invariant(format!(
                "time moved backward from {} to {}",
                self.now, scheduled.time
            )));
        }
        self.now = scheduled.time;
        Ok(Some((scheduled.time, scheduled.event)))
    }

    /// Time of the next pending event without removing it
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|event| event.time)
    }

    /// Check if there are any events remaining in the queue
    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }
}

impl<E> Default for EventScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
