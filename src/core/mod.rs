pub mod config;
pub mod entity;
pub mod errors;
pub mod event;
pub mod event_scheduler;
pub mod monitor;
pub mod simulation_engine;
pub mod sink;
pub mod station;
pub mod types;
