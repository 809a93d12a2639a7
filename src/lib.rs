pub mod assembly;
pub mod core;

// Re-export commonly used types
pub use crate::assembly::config::AssemblyConfig;
pub use crate::assembly::environment::{AssemblyEnv, StepOutcome};
pub use crate::assembly::prediction::{predict_lead_time, LeadTimeForecast};
pub use crate::core::config::{ConcurrencyMode, LineConfig};
pub use crate::core::entity::Entity;
pub use crate::core::errors::AssemblyError;
pub use crate::core::simulation_engine::SimulationEngine;
pub use crate::core::types::{EntityId, SimTime, StationId};
