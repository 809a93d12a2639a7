pub mod config;
pub mod environment;
pub mod policy;
pub mod prediction;
pub mod rollout;
pub mod schedule;

pub use config::AssemblyConfig;
pub use environment::{AssemblyEnv, StepOutcome};
pub use policy::{FirstInQueue, MinForecast, Policy, RandomPolicy, ShortestProcessingTime};
pub use prediction::{predict_lead_time, LeadTimeForecast};
pub use rollout::{evaluate, run_episode, EpisodeSummary, EvaluationReport};
pub use schedule::SyntheticSchedule;
