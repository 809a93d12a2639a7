use super::types::EntityId;
use thiserror::Error;

/// Errors raised by the production line and the assembly environment.
///
/// `InvalidAction` and `EmptyQueue` are caller errors and leave the episode untouched.
/// `SimulationInvariant` indicates a bug in the simulator and should abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("action {action} is outside the queue of length {queue_len}")]
    InvalidAction { action: usize, queue_len: usize },
    #[error("no blocks left in the queue to admit")]
    EmptyQueue,
    #[error("block {entity} has no processing step {step} (defines {steps})")]
    OutOfSteps {
        entity: EntityId,
        step: usize,
        steps: usize,
    },
    #[error("simulation invariant violated: {0}")]
    SimulationInvariant(String),
}

impl AssemblyError {
    /// Build a `SimulationInvariant` error and log it, since these always abort the run
    pub fn invariant(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::error!("[Simulation] invariant violated: {}", msg);
        AssemblyError::SimulationInvariant(msg)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, AssemblyError::SimulationInvariant(_))
    }
}
