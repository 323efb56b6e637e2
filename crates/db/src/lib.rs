//! Entity store for the TwinAI engine.
//!
//! [`AssetStore`] is the storage seam: the simulator, evaluator and service
//! layers only ever talk to `Arc<dyn AssetStore>`. [`MemStore`] is the
//! process-lifetime in-memory backend.

pub mod memory;
pub mod store;

pub use memory::MemStore;
pub use store::{AssetStore, StoreResult};
