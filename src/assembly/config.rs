use crate::core::config::{ConcurrencyMode, LineConfig};
use crate::core::entity::Entity;
use crate::core::errors::AssemblyError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for the assembly environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Shape of the production line
    pub line: LineConfig,
    /// Number of visible queue slots the agent chooses from
    pub queue_capacity: usize,
    /// Seed for the environment's own shuffle generator; `None` draws from entropy
    pub random_seed: Option<u64>,
    /// How `rollout::evaluate` runs independent episodes
    pub concurrency_mode: ConcurrencyMode,
    /// Dedicated worker count for `ConcurrencyMode::Rayon`, global pool when `None`
    pub thread_pool_size: Option<usize>,
}

impl AssemblyConfig {
    pub fn new(num_stations: usize, queue_capacity: usize) -> Self {
        Self {
            line: LineConfig::new(num_stations),
            queue_capacity,
            ..Self::default()
        }
    }

    pub fn with_line(mut self, line: LineConfig) -> Self {
        self.line = line;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn num_stations(&self) -> usize {
        self.line.num_stations
    }

    /// Length of the observation vector: one gap per station plus one duration
    /// row per queue slot
    pub fn state_size(&self) -> usize {
        self.line.num_stations + self.line.num_stations * self.queue_capacity
    }

    /// Number of discrete actions, one per queue slot
    pub fn action_size(&self) -> usize {
        self.queue_capacity
    }

    pub fn validate(&self) -> Result<(), AssemblyError> {
        self.line.validate()?;
        if self.queue_capacity == 0 {
            return Err(AssemblyError::Configuration("queue capacity must be positive".to_string()));
        }
        if self.thread_pool_size == Some(0) {
            return Err(AssemblyError::Configuration("thread pool needs at least one thread".to_string()));
        }
        Ok(())
    }

    /// Check a backlog against this line: non-empty, unique ids, one finite,
    /// non-negative duration per station
    pub fn validate_backlog(&self, backlog: &[Entity]) -> Result<(), AssemblyError> {
        if backlog.is_empty() {
            return Err(AssemblyError::Configuration("backlog is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for block in backlog {
            if !seen.insert(block.id().as_str()) {
                return Err(AssemblyError::Configuration(format!("duplicate block id {}", block.id())));
            }
            if block.num_steps() != self.line.num_stations {
                return Err(AssemblyError::Configuration(format!(
                    "block {} defines {} durations for a line of {} stations",
                    block.id(),
                    block.num_steps(),
                    self.line.num_stations
                )));
            }
            if let Some(bad) = block.durations().iter().find(|d| !d.is_finite() || **d < 0.0) {
                return Err(AssemblyError::Configuration(format!(
                    "block {} has invalid duration {}",
                    block.id(),
                    bad
                )));
            }
        }
        Ok(())
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            line: LineConfig::default(),
            queue_capacity: 10,
            random_seed: Some(42),
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }
}
