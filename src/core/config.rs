//! Configuration for the production line and for running episodes
//!
//! This module provides the line shape (station count, servers and buffer slots per
//! station) and the concurrency mode used when many episodes are evaluated at once.

use super::errors::AssemblyError;
use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Episodes run one after another on the calling thread
    #[default]
    Sequential,
    /// Independent episodes run in parallel using Rayon
    Rayon,
}

/// Shape of the line: a chain of identical stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Number of stations between source and sink
    pub num_stations: usize,
    /// Service slots per station
    pub station_servers: usize,
    /// FIFO buffer slots per station, in addition to the service slots
    pub station_buffer_capacity: usize,
}

impl LineConfig {
    /// Create a line of `num_stations` single-server stations with one buffer slot each
    pub fn new(num_stations: usize) -> Self {
        Self {
            num_stations,
            station_servers: 1,
            station_buffer_capacity: 1,
        }
    }

    /// Set the number of service slots per station
    pub fn with_servers(mut self, servers: usize) -> Self {
        self.station_servers = servers;
        self
    }

    /// Set the buffer capacity per station
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.station_buffer_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.num_stations == 0 {
            return Err(AssemblyError::Configuration("line needs at least one station".to_string()));
        }
        if self.station_servers == 0 {
            return Err(AssemblyError::Configuration(
                "stations need at least one server".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::new(7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LineConfig::default();
        assert_eq!(config.num_stations, 7);
        assert_eq!(config.station_servers, 1);
        assert_eq!(config.station_buffer_capacity, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = LineConfig::new(3).with_servers(2).with_buffer_capacity(0);
        assert_eq!(config.num_stations, 3);
        assert_eq!(config.station_servers, 2);
        assert_eq!(config.station_buffer_capacity, 0);
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(LineConfig::new(0).validate().is_err());
        assert!(LineConfig::new(2).with_servers(0).validate().is_err());
    }

    #[test]
    fn test_concurrency_mode_default() {
        assert_eq!(ConcurrencyMode::default(), ConcurrencyMode::Sequential);
        assert_ne!(ConcurrencyMode::Sequential, ConcurrencyMode::Rayon);
    }
}
