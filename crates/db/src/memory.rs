//! In-memory [`AssetStore`] backend.
//!
//! Each collection sits behind its own `tokio::sync::RwLock`: reads run
//! concurrently, writes are serialized per collection. When a write needs
//! two collections the lock order is spares, then maintenance logs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use twinai_core::alert::{Alert, CreateAlert};
use twinai_core::error::CoreError;
use twinai_core::machine::{CreateMachine, Machine, UpdateMachine};
use twinai_core::maintenance::{
    apply_replacement, CreateMaintenanceLog, MaintenanceLog, MaintenanceType,
};
use twinai_core::spare::{CreateSpare, CriticalSpare, UpdateSpare};
use twinai_core::types::{new_id, EntityId};

use crate::store::{AssetStore, StoreResult};

/// Spare rows plus the unique item-code index and the seed flag.
#[derive(Debug, Default)]
struct SpareTable {
    rows: HashMap<EntityId, CriticalSpare>,
    codes: HashMap<String, EntityId>,
    loaded: bool,
}

impl SpareTable {
    fn insert(&mut self, input: CreateSpare) -> StoreResult<CriticalSpare> {
        if self.codes.contains_key(&input.item_code) {
            return Err(CoreError::Conflict(format!(
                "Spare with item code {} already exists",
                input.item_code
            )));
        }
        let spare = CriticalSpare::from_create(new_id(), input, Utc::now());
        self.codes.insert(spare.item_code.clone(), spare.id);
        self.rows.insert(spare.id, spare.clone());
        Ok(spare)
    }

    fn sorted(&self) -> Vec<CriticalSpare> {
        let mut spares: Vec<CriticalSpare> = self.rows.values().cloned().collect();
        spares.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        spares
    }
}

/// Process-lifetime entity store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemStore {
    machines: RwLock<HashMap<EntityId, Machine>>,
    spares: RwLock<SpareTable>,
    alerts: RwLock<Vec<Alert>>,
    maintenance_logs: RwLock<Vec<MaintenanceLog>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_machines(rows: &HashMap<EntityId, Machine>) -> Vec<Machine> {
    let mut machines: Vec<Machine> = rows.values().cloned().collect();
    machines.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    machines
}

#[async_trait]
impl AssetStore for MemStore {
    // -- Machines ----------------------------------------------------------

    async fn list_machines(&self) -> StoreResult<Vec<Machine>> {
        Ok(sorted_machines(&*self.machines.read().await))
    }

    async fn get_machine(&self, id: EntityId) -> StoreResult<Option<Machine>> {
        Ok(self.machines.read().await.get(&id).cloned())
    }

    async fn insert_machine(&self, input: CreateMachine) -> StoreResult<Machine> {
        let machine = Machine::from_create(new_id(), input, Utc::now());
        self.machines
            .write()
            .await
            .insert(machine.id, machine.clone());
        Ok(machine)
    }

    async fn update_machine(
        &self,
        id: EntityId,
        update: &UpdateMachine,
    ) -> StoreResult<Option<Machine>> {
        let mut machines = self.machines.write().await;
        Ok(machines.get_mut(&id).map(|machine| {
            machine.apply_update(update, Utc::now());
            machine.clone()
        }))
    }

    async fn delete_machine(&self, id: EntityId) -> StoreResult<bool> {
        Ok(self.machines.write().await.remove(&id).is_some())
    }

    async fn advance_machines(
        &self,
        step: &mut (dyn for<'m> FnMut(&'m mut Machine) + Send),
    ) -> StoreResult<Vec<Machine>> {
        let mut machines = self.machines.write().await;
        for machine in machines.values_mut() {
            step(machine);
        }
        Ok(sorted_machines(&machines))
    }

    // -- Spares ------------------------------------------------------------

    async fn list_spares(&self) -> StoreResult<Vec<CriticalSpare>> {
        Ok(self.spares.read().await.sorted())
    }

    async fn get_spare(&self, id: EntityId) -> StoreResult<Option<CriticalSpare>> {
        Ok(self.spares.read().await.rows.get(&id).cloned())
    }

    async fn insert_spare(&self, input: CreateSpare) -> StoreResult<CriticalSpare> {
        self.spares.write().await.insert(input)
    }

    async fn update_spare(
        &self,
        id: EntityId,
        update: &UpdateSpare,
    ) -> StoreResult<Option<CriticalSpare>> {
        let mut table = self.spares.write().await;
        Ok(table.rows.get_mut(&id).map(|spare| {
            spare.apply_update(update, Utc::now());
            spare.clone()
        }))
    }

    async fn delete_spare(&self, id: EntityId) -> StoreResult<bool> {
        let mut table = self.spares.write().await;
        match table.rows.remove(&id) {
            Some(spare) => {
                table.codes.remove(&spare.item_code);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn advance_spares(
        &self,
        step: &mut (dyn for<'s> FnMut(&'s mut CriticalSpare) + Send),
    ) -> StoreResult<Vec<CriticalSpare>> {
        let mut table = self.spares.write().await;
        for spare in table.rows.values_mut() {
            step(spare);
        }
        Ok(table.sorted())
    }

    async fn consume_spare_stock(
        &self,
        id: EntityId,
        units: u32,
    ) -> StoreResult<Option<(CriticalSpare, u32)>> {
        let mut table = self.spares.write().await;
        Ok(table.rows.get_mut(&id).map(|spare| {
            let drawn = units.min(spare.quantity_in_hand);
            spare.quantity_in_hand -= drawn;
            spare.updated_at = Utc::now();
            (spare.clone(), drawn)
        }))
    }

    async fn spares_loaded(&self) -> StoreResult<bool> {
        Ok(self.spares.read().await.loaded)
    }

    async fn seed_spares(&self, rows: Vec<CreateSpare>) -> StoreResult<Vec<CriticalSpare>> {
        let mut table = self.spares.write().await;
        if table.loaded {
            return Ok(table.sorted());
        }

        let offered = rows.len();
        let mut inserted = 0usize;
        for row in rows {
            let code = row.item_code.clone();
            match table.insert(row) {
                Ok(_) => inserted += 1,
                Err(e) => tracing::warn!(item_code = %code, error = %e, "Skipping seed row"),
            }
        }
        table.loaded = true;

        tracing::info!(offered, inserted, "Critical spares seeded");
        Ok(table.sorted())
    }

    // -- Alerts ------------------------------------------------------------

    async fn list_alerts(&self) -> StoreResult<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self.alerts.read().await.iter().rev().cloned().collect();
        // Stable sort keeps insertion order (newest first) for equal timestamps.
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn insert_alert(&self, input: CreateAlert) -> StoreResult<Alert> {
        let alert = Alert::from_create(new_id(), input, Utc::now());
        self.alerts.write().await.push(alert.clone());
        Ok(alert)
    }

    async fn record_alert_delivery(&self, id: EntityId, sent: bool) -> StoreResult<bool> {
        let mut alerts = self.alerts.write().await;
        Ok(alerts
            .iter_mut()
            .rev()
            .find(|a| a.id == id)
            .map(|alert| alert.sent_via_whatsapp = sent)
            .is_some())
    }

    // -- Maintenance logs --------------------------------------------------

    async fn list_maintenance_logs(
        &self,
        spare_id: Option<EntityId>,
    ) -> StoreResult<Vec<MaintenanceLog>> {
        let logs = self.maintenance_logs.read().await;
        Ok(logs
            .iter()
            .filter(|log| spare_id.map_or(true, |id| log.spare_id == id))
            .cloned()
            .collect())
    }

    async fn insert_maintenance_log(
        &self,
        input: CreateMaintenanceLog,
    ) -> StoreResult<MaintenanceLog> {
        let mut table = self.spares.write().await;
        let spare = table
            .rows
            .get_mut(&input.spare_id)
            .ok_or_else(|| CoreError::not_found("critical_spare", input.spare_id))?;

        let now = Utc::now();
        if input.maintenance_type == MaintenanceType::Replacement {
            apply_replacement(spare, input.quantity_used, now);
        }

        let log = MaintenanceLog::from_create(new_id(), input, now);
        self.maintenance_logs.write().await.push(log.clone());
        drop(table);

        Ok(log)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use twinai_core::alert::{AlertSeverity, AlertSubject, AlertType};
    use twinai_core::machine::ComponentType;

    use super::*;

    fn machine_input(name: &str) -> CreateMachine {
        CreateMachine {
            name: name.to_string(),
            component_type: ComponentType::ToolMagazine,
            initial_life: 60.0,
            operating_hours: 40.0,
            load_factor: 0.5,
            replacement_cost: 30_000.0,
        }
    }

    fn spare_input(code: &str) -> CreateSpare {
        CreateSpare {
            item_code: code.to_string(),
            item_description: "Limit switch".to_string(),
            unit: "Nos".to_string(),
            min_stock: 1,
            reorder_level: 2,
            quantity_in_hand: 4,
            machine_type: "CNC".to_string(),
            operating_hours: 10,
            load_factor: 1.0,
            wear_percentage: 5.0,
            expected_life_hours: 26_280,
            last_maintenance_date: None,
            predicted_replacement_date: None,
            replacement_cost_inr: 4_000.0,
        }
    }

    #[tokio::test]
    async fn advance_machines_mutates_every_row() {
        let store = MemStore::new();
        store.insert_machine(machine_input("A")).await.unwrap();
        store.insert_machine(machine_input("B")).await.unwrap();

        let advanced = store
            .advance_machines(&mut |m: &mut Machine| m.remaining_life -= 1.0)
            .await
            .unwrap();

        assert_eq!(advanced.len(), 2);
        assert!(advanced.iter().all(|m| m.remaining_life == 59.0));
        let listed = store.list_machines().await.unwrap();
        assert!(listed.iter().all(|m| m.remaining_life == 59.0));
    }

    #[tokio::test]
    async fn duplicate_item_code_conflicts() {
        let store = MemStore::new();
        store.insert_spare(spare_input("SW-1")).await.unwrap();
        let err = store.insert_spare(spare_input("SW-1")).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_spare_frees_item_code() {
        let store = MemStore::new();
        let spare = store.insert_spare(spare_input("SW-2")).await.unwrap();
        assert!(store.delete_spare(spare.id).await.unwrap());
        assert!(!store.delete_spare(spare.id).await.unwrap());
        assert!(store.insert_spare(spare_input("SW-2")).await.is_ok());
    }

    #[tokio::test]
    async fn consume_stock_floors_at_zero() {
        let store = MemStore::new();
        let mut input = spare_input("SW-3");
        input.quantity_in_hand = 1;
        let spare = store.insert_spare(input).await.unwrap();

        let (updated, drawn) = store.consume_spare_stock(spare.id, 2).await.unwrap().unwrap();
        assert_eq!(updated.quantity_in_hand, 0);
        assert_eq!(drawn, 1);
    }

    #[tokio::test]
    async fn delivery_outcome_is_recorded_on_alert() {
        let store = MemStore::new();
        let alert = store
            .insert_alert(CreateAlert {
                subject: AlertSubject::Spare(new_id()),
                message: "low".to_string(),
                severity: AlertSeverity::Warning,
                alert_type: AlertType::Stock,
                sent_via_whatsapp: false,
            })
            .await
            .unwrap();

        assert!(store.record_alert_delivery(alert.id, true).await.unwrap());
        assert!(!store.record_alert_delivery(new_id(), true).await.unwrap());
        assert!(store.list_alerts().await.unwrap()[0].sent_via_whatsapp);
    }

    #[tokio::test]
    async fn log_for_unknown_spare_is_rejected() {
        let store = MemStore::new();
        let err = store
            .insert_maintenance_log(CreateMaintenanceLog {
                spare_id: new_id(),
                maintenance_type: MaintenanceType::Inspection,
                quantity_used: 1,
                cost: None,
                notes: None,
                performed_by: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "critical_spare", .. }));
        assert!(store.list_maintenance_logs(None).await.unwrap().is_empty());
    }
}
