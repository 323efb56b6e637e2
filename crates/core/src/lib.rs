//! TwinAI domain core.
//!
//! Pure domain logic with no I/O: entity types, the wear-advancement math,
//! the alert threshold rules, the spare keyword catalog and the seedable
//! random source used by the simulator. Everything here is synchronous so
//! it can be tested in isolation.

pub mod alert;
pub mod catalog;
pub mod error;
pub mod machine;
pub mod maintenance;
pub mod rng;
pub mod spare;
pub mod thresholds;
pub mod types;
pub mod validation;
pub mod wear;
