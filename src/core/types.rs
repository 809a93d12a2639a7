/// Simulated time. Durations in panel-block schedules are fractional hours.
pub type SimTime = f64;

/// Identifier of a panel block, as it appears in the input schedule
pub type EntityId = String;

/// Position of a station in the line. Station `0` receives blocks from the source,
/// station `n - 1` hands off to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(pub usize);

impl StationId {
    pub fn index(&self) -> usize {
        self.0
    }

    /// The next station downstream, or `None` when this is the last station
    pub fn next(&self, num_stations: usize) -> Option<StationId> {
        if self.0 + 1 < num_stations {
            Some(StationId(self.0 + 1))
        } else {
            None
        }
    }

    /// The station feeding this one, or `None` for the first station
    pub fn previous(&self) -> Option<StationId> {
        self.0.checked_sub(1).map(StationId)
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Station{}", self.0)
    }
}
