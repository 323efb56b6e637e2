//! The storage trait shared by every backend.

use async_trait::async_trait;
use twinai_core::alert::{Alert, CreateAlert};
use twinai_core::error::CoreError;
use twinai_core::machine::{CreateMachine, Machine, UpdateMachine};
use twinai_core::maintenance::{CreateMaintenanceLog, MaintenanceLog};
use twinai_core::spare::{CreateSpare, CriticalSpare, UpdateSpare};
use twinai_core::types::EntityId;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, CoreError>;

/// Owns all mutable entity state.
///
/// Lookups return `Option` and deletes return `bool`; mapping an absent row
/// to [`CoreError::NotFound`] is left to the caller. Every method must be
/// safe to call concurrently, and no method may await external I/O while it
/// holds a collection lock.
#[async_trait]
pub trait AssetStore: Send + Sync {
    // -- Machines ----------------------------------------------------------

    /// All machines, oldest first.
    async fn list_machines(&self) -> StoreResult<Vec<Machine>>;

    async fn get_machine(&self, id: EntityId) -> StoreResult<Option<Machine>>;

    /// Insert a machine with a fresh id; `remaining_life` starts at `initial_life`.
    async fn insert_machine(&self, input: CreateMachine) -> StoreResult<Machine>;

    /// Merge an administrative edit. `None` when the id is unknown.
    async fn update_machine(
        &self,
        id: EntityId,
        update: &UpdateMachine,
    ) -> StoreResult<Option<Machine>>;

    /// Remove a machine. Returns `true` if a row was deleted.
    async fn delete_machine(&self, id: EntityId) -> StoreResult<bool>;

    /// Apply `step` to every machine as one atomic pass and return the
    /// post-pass rows. Readers never observe a partially advanced pass.
    async fn advance_machines(
        &self,
        step: &mut (dyn for<'m> FnMut(&'m mut Machine) + Send),
    ) -> StoreResult<Vec<Machine>>;

    // -- Spares ------------------------------------------------------------

    /// All spares, oldest first.
    async fn list_spares(&self) -> StoreResult<Vec<CriticalSpare>>;

    async fn get_spare(&self, id: EntityId) -> StoreResult<Option<CriticalSpare>>;

    /// Insert a spare. Fails with [`CoreError::Conflict`] on a duplicate item code.
    async fn insert_spare(&self, input: CreateSpare) -> StoreResult<CriticalSpare>;

    async fn update_spare(
        &self,
        id: EntityId,
        update: &UpdateSpare,
    ) -> StoreResult<Option<CriticalSpare>>;

    async fn delete_spare(&self, id: EntityId) -> StoreResult<bool>;

    /// Atomic per-spare counterpart of [`advance_machines`](Self::advance_machines).
    async fn advance_spares(
        &self,
        step: &mut (dyn for<'s> FnMut(&'s mut CriticalSpare) + Send),
    ) -> StoreResult<Vec<CriticalSpare>>;

    /// Draw up to `units` from a spare's stock, floored at zero.
    ///
    /// Returns the updated spare and the units actually drawn, or `None` for
    /// an unknown id.
    async fn consume_spare_stock(
        &self,
        id: EntityId,
        units: u32,
    ) -> StoreResult<Option<(CriticalSpare, u32)>>;

    /// Whether the one-time seed has already run in this process.
    async fn spares_loaded(&self) -> StoreResult<bool>;

    /// Insert seed rows once per process and return the full spare set.
    ///
    /// If seeding already happened the rows are ignored and the existing set
    /// is returned unchanged. Rows with an item code already present are
    /// skipped.
    async fn seed_spares(&self, rows: Vec<CreateSpare>) -> StoreResult<Vec<CriticalSpare>>;

    // -- Alerts ------------------------------------------------------------

    /// All alerts, newest first.
    async fn list_alerts(&self) -> StoreResult<Vec<Alert>>;

    async fn insert_alert(&self, input: CreateAlert) -> StoreResult<Alert>;

    /// Record the outcome of the single delivery attempt for an alert.
    ///
    /// Returns `false` if the alert does not exist.
    async fn record_alert_delivery(&self, id: EntityId, sent: bool) -> StoreResult<bool>;

    // -- Maintenance logs --------------------------------------------------

    /// Logs in insertion order, optionally restricted to one spare.
    async fn list_maintenance_logs(
        &self,
        spare_id: Option<EntityId>,
    ) -> StoreResult<Vec<MaintenanceLog>>;

    /// Append a log. A `replacement` log also renews the spare, atomically
    /// with respect to every other spare writer. Fails with
    /// [`CoreError::NotFound`] if the spare does not exist.
    async fn insert_maintenance_log(
        &self,
        input: CreateMaintenanceLog,
    ) -> StoreResult<MaintenanceLog>;
}
