//! The TwinAI simulation and alerting pipeline.
//!
//! Wires the entity store, the degradation simulator, threshold evaluation
//! and notification delivery together behind [`AssetService`], and drives
//! periodic passes with the [`Scheduler`].

pub mod alerts;
pub mod config;
pub mod import;
pub mod scheduler;
pub mod service;
pub mod simulator;

pub use config::EngineConfig;
pub use scheduler::Scheduler;
pub use service::AssetService;
