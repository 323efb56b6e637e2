//! The boundary facade over the store, simulator and alert pipeline.
//!
//! Every on-demand operation (create, simulate-now, manual alert, ad-hoc
//! send) goes through [`AssetService`], and the [`Scheduler`](crate::Scheduler)
//! drives [`AssetService::run_cycle`] on its timer. Absent rows surface as
//! [`CoreError::NotFound`].

use std::sync::Arc;

use tokio::sync::Mutex;
use twinai_core::alert::{Alert, AlertSubject, CreateAlert};
use twinai_core::catalog::SpareRow;
use twinai_core::error::CoreError;
use twinai_core::machine::{
    validate_create_machine, validate_update_machine, CreateMachine, Machine, UpdateMachine,
};
use twinai_core::maintenance::{CreateMaintenanceLog, MaintenanceLog};
use twinai_core::rng::SimRng;
use twinai_core::spare::{
    validate_create_spare, validate_update_spare, CreateSpare, CriticalSpare, UpdateSpare,
};
use twinai_core::thresholds::AlertPolicy;
use twinai_core::types::EntityId;
use twinai_core::validation::validate_non_negative;
use twinai_db::AssetStore;
use twinai_events::{
    ChannelError, DeliveryOutcome, NotificationChannel, NotificationDispatcher, OutboundMessage,
};

use crate::alerts::AlertPipeline;
use crate::config::EngineConfig;
use crate::import::{ImportError, SpareSource};
use crate::simulator::{ConsumptionReport, Simulator};

type Result<T> = std::result::Result<T, CoreError>;

/// Outcome of one scheduler pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub machines_advanced: usize,
    pub spares_advanced: usize,
    pub alerts_raised: usize,
    /// Present when the pass ran inventory consumption.
    pub consumption: Option<ConsumptionReport>,
}

pub struct AssetService {
    store: Arc<dyn AssetStore>,
    simulator: Simulator,
    alerts: AlertPipeline,
    spare_source: Arc<dyn SpareSource>,
    config: EngineConfig,
    /// Serializes first-time seeding so the source is read once.
    seed_guard: Mutex<()>,
}

impl AssetService {
    pub fn new(
        store: Arc<dyn AssetStore>,
        channel: Arc<dyn NotificationChannel>,
        spare_source: Arc<dyn SpareSource>,
        config: EngineConfig,
    ) -> Self {
        let rng = SimRng::from_seed_opt(config.rng_seed);
        Self {
            simulator: Simulator::new(Arc::clone(&store), rng),
            alerts: AlertPipeline::new(
                Arc::clone(&store),
                NotificationDispatcher::new(channel),
                config.alert_policy,
            ),
            store,
            spare_source,
            config,
            seed_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        self.alerts.policy()
    }

    // -- Machines ----------------------------------------------------------

    pub async fn list_machines(&self) -> Result<Vec<Machine>> {
        self.store.list_machines().await
    }

    pub async fn get_machine(&self, id: EntityId) -> Result<Machine> {
        self.store
            .get_machine(id)
            .await?
            .ok_or_else(|| CoreError::not_found("machine", id))
    }

    /// Create a machine and evaluate it immediately, so a machine created
    /// below the critical threshold raises its alert right away.
    pub async fn create_machine(&self, input: CreateMachine) -> Result<Machine> {
        validate_create_machine(&input)?;
        let machine = self.store.insert_machine(input).await?;
        tracing::info!(machine_id = %machine.id, name = %machine.name, "Machine created");

        self.alerts
            .raise_for_machines(std::slice::from_ref(&machine))
            .await?;
        Ok(machine)
    }

    pub async fn update_machine(&self, id: EntityId, update: UpdateMachine) -> Result<Machine> {
        validate_update_machine(&update)?;
        self.store
            .update_machine(id, &update)
            .await?
            .ok_or_else(|| CoreError::not_found("machine", id))
    }

    pub async fn delete_machine(&self, id: EntityId) -> Result<()> {
        if !self.store.delete_machine(id).await? {
            return Err(CoreError::not_found("machine", id));
        }
        self.alerts.forget(&AlertSubject::Machine(id));
        tracing::info!(machine_id = %id, "Machine deleted");
        Ok(())
    }

    /// Run one machine tick now and evaluate the result.
    pub async fn simulate_machines(&self) -> Result<Vec<Machine>> {
        Ok(self.advance_machines().await?.0)
    }

    async fn advance_machines(&self) -> Result<(Vec<Machine>, usize)> {
        let machines = self.simulator.tick_machines().await?;
        let raised = self.alerts.raise_for_machines(&machines).await?;
        Ok((machines, raised.len()))
    }

    // -- Spares ------------------------------------------------------------

    /// All spares, seeding from the configured source on first use.
    pub async fn list_spares(&self) -> Result<Vec<CriticalSpare>> {
        if !self.store.spares_loaded().await? {
            return self.load_spares().await;
        }
        self.store.list_spares().await
    }

    /// Seed spares from the configured source once per process and return the
    /// full spare set. An unreadable source counts as zero rows.
    pub async fn load_spares(&self) -> Result<Vec<CriticalSpare>> {
        let _guard = self.seed_guard.lock().await;
        if self.store.spares_loaded().await? {
            return self.store.list_spares().await;
        }

        let rows = match self.read_spare_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "Spare data source unavailable, seeding no spares");
                Vec::new()
            }
        };
        let seed = self.simulator.derive_seed_spares(&rows).await;
        self.store.seed_spares(seed).await
    }

    async fn read_spare_rows(&self) -> Result<Vec<SpareRow>> {
        let source = Arc::clone(&self.spare_source);
        tokio::task::spawn_blocking(move || source.rows())
            .await
            .map_err(|e| CoreError::Internal(format!("spare import task failed: {e}")))?
            .map_err(|e: ImportError| CoreError::DataSourceUnavailable(e.to_string()))
    }

    pub async fn get_spare(&self, id: EntityId) -> Result<CriticalSpare> {
        self.store
            .get_spare(id)
            .await?
            .ok_or_else(|| CoreError::not_found("critical_spare", id))
    }

    pub async fn create_spare(&self, input: CreateSpare) -> Result<CriticalSpare> {
        validate_create_spare(&input)?;
        let spare = self.store.insert_spare(input).await?;
        tracing::info!(spare_id = %spare.id, item_code = %spare.item_code, "Spare created");
        Ok(spare)
    }

    pub async fn update_spare(&self, id: EntityId, update: UpdateSpare) -> Result<CriticalSpare> {
        validate_update_spare(&update)?;
        self.store
            .update_spare(id, &update)
            .await?
            .ok_or_else(|| CoreError::not_found("critical_spare", id))
    }

    pub async fn delete_spare(&self, id: EntityId) -> Result<()> {
        if !self.store.delete_spare(id).await? {
            return Err(CoreError::not_found("critical_spare", id));
        }
        self.alerts.forget(&AlertSubject::Spare(id));
        tracing::info!(spare_id = %id, "Spare deleted");
        Ok(())
    }

    /// Run one spare tick now and evaluate the result.
    pub async fn simulate_spares(&self) -> Result<Vec<CriticalSpare>> {
        Ok(self.advance_spares().await?.0)
    }

    async fn advance_spares(&self) -> Result<(Vec<CriticalSpare>, usize)> {
        let spares = self.simulator.tick_spares().await?;
        let raised = self.alerts.raise_for_spares(&spares).await?;
        Ok((spares, raised.len()))
    }

    /// Draw stock from randomly chosen spares, logging each draw.
    pub async fn consume_inventory(&self) -> Result<ConsumptionReport> {
        self.simulator
            .consume_inventory(self.config.consumption_chance)
            .await
    }

    // -- Alerts ------------------------------------------------------------

    /// All alerts, newest first.
    pub async fn list_alerts(&self) -> Result<Vec<Alert>> {
        self.store.list_alerts().await
    }

    /// Record a manual alert, optionally sending its message.
    pub async fn create_alert(&self, input: CreateAlert, notify: bool) -> Result<Alert> {
        if input.message.trim().is_empty() {
            return Err(CoreError::Validation("message must not be blank".to_string()));
        }
        self.alerts.create_alert(input, notify).await
    }

    /// Send an ad-hoc message through the notification channel.
    pub async fn send_message(
        &self,
        message: &OutboundMessage,
    ) -> std::result::Result<DeliveryOutcome, ChannelError> {
        self.alerts.dispatcher().channel().send(message).await
    }

    /// Wait for every pending notification to record its outcome.
    pub async fn flush_deliveries(&self) {
        self.alerts.flush_deliveries().await;
    }

    // -- Maintenance logs --------------------------------------------------

    pub async fn list_maintenance_logs(
        &self,
        spare_id: Option<EntityId>,
    ) -> Result<Vec<MaintenanceLog>> {
        self.store.list_maintenance_logs(spare_id).await
    }

    /// Record a service event. A replacement also renews the spare.
    pub async fn create_maintenance_log(
        &self,
        input: CreateMaintenanceLog,
    ) -> Result<MaintenanceLog> {
        if let Some(cost) = input.cost {
            validate_non_negative(cost, "cost")?;
        }
        let log = self.store.insert_maintenance_log(input).await?;
        tracing::info!(
            log_id = %log.id,
            spare_id = %log.spare_id,
            maintenance_type = log.maintenance_type.as_str(),
            "Maintenance logged"
        );
        Ok(log)
    }

    // -- Cycle -------------------------------------------------------------

    /// One full pass: machine tick and evaluation, spare tick and evaluation,
    /// then a chance of inventory consumption.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let (machines, machine_alerts) = self.advance_machines().await?;
        let (spares, spare_alerts) = self.advance_spares().await?;

        let consumption = if self.simulator.roll(self.config.consumption_probability).await {
            Some(self.consume_inventory().await?)
        } else {
            None
        };

        let report = CycleReport {
            machines_advanced: machines.len(),
            spares_advanced: spares.len(),
            alerts_raised: machine_alerts + spare_alerts,
            consumption,
        };
        tracing::info!(
            machines = report.machines_advanced,
            spares = report.spares_advanced,
            alerts = report.alerts_raised,
            consumed_units = report.consumption.as_ref().map_or(0, |c| c.units),
            "Simulation cycle complete"
        );
        Ok(report)
    }
}
