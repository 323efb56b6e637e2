//! Degradation simulator.
//!
//! Advances machines and spares by one tick and draws automated inventory
//! consumption. The wear math lives in `twinai_core::wear`; this module owns
//! the random source and applies each pass through a single store call so
//! readers never see a half-advanced pass.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use twinai_core::catalog::{seed_spare, SpareRow};
use twinai_core::machine::Machine;
use twinai_core::maintenance::CreateMaintenanceLog;
use twinai_core::rng::SimRng;
use twinai_core::spare::{CreateSpare, CriticalSpare};
use twinai_core::types::EntityId;
use twinai_core::wear::{advance_machine, advance_spare};
use twinai_db::{AssetStore, StoreResult};

/// Summary of one inventory-consumption pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumptionReport {
    /// Spares that had stock drawn.
    pub spares: usize,
    /// Total units drawn across all spares.
    pub units: u32,
}

pub struct Simulator {
    store: Arc<dyn AssetStore>,
    rng: Mutex<SimRng>,
}

impl Simulator {
    pub fn new(store: Arc<dyn AssetStore>, rng: SimRng) -> Self {
        Self {
            store,
            rng: Mutex::new(rng),
        }
    }

    /// Apply one wear tick to every machine and return the post-tick rows.
    pub async fn tick_machines(&self) -> StoreResult<Vec<Machine>> {
        let now = Utc::now();
        self.store
            .advance_machines(&mut |machine: &mut Machine| advance_machine(machine, now))
            .await
    }

    /// Apply one wear tick to every spare and return the post-tick rows.
    pub async fn tick_spares(&self) -> StoreResult<Vec<CriticalSpare>> {
        let now = Utc::now();
        let mut rng = self.rng.lock().await;
        let rng = &mut *rng;
        self.store
            .advance_spares(&mut |spare: &mut CriticalSpare| {
                advance_spare(spare, rng.tick_hours(), now)
            })
            .await
    }

    /// `true` with probability `p`, drawn from the simulator's random source.
    pub async fn roll(&self, p: f64) -> bool {
        self.rng.lock().await.chance(p)
    }

    /// Draw stock from randomly chosen spares.
    ///
    /// Each spare with stock is picked independently with probability
    /// `chance`, draws 1 or 2 units (floored at zero) and gets a repair log.
    /// A spare deleted mid-pass is skipped.
    pub async fn consume_inventory(&self, chance: f64) -> StoreResult<ConsumptionReport> {
        let spares = self.store.list_spares().await?;

        let picks: Vec<(EntityId, u32)> = {
            let mut rng = self.rng.lock().await;
            let mut picks = Vec::new();
            for spare in spares.iter().filter(|s| s.quantity_in_hand > 0) {
                if rng.chance(chance) {
                    picks.push((spare.id, rng.consumed_units()));
                }
            }
            picks
        };

        let mut report = ConsumptionReport::default();
        for (spare_id, units) in picks {
            let Some((spare, drawn)) = self.store.consume_spare_stock(spare_id, units).await? else {
                continue;
            };
            if drawn == 0 {
                continue;
            }

            if let Err(e) = self
                .store
                .insert_maintenance_log(CreateMaintenanceLog::auto_consumption(&spare, drawn))
                .await
            {
                tracing::warn!(spare_id = %spare.id, error = %e, "Consumption log not recorded");
                continue;
            }

            tracing::debug!(
                item_code = %spare.item_code,
                consumed = drawn,
                remaining = spare.quantity_in_hand,
                "Spare stock consumed"
            );
            report.spares += 1;
            report.units += drawn;
        }
        Ok(report)
    }

    /// Derive seedable spares from raw import rows. Rows without an item code
    /// are skipped with a warning.
    pub async fn derive_seed_spares(&self, rows: &[SpareRow]) -> Vec<CreateSpare> {
        let now = Utc::now();
        let mut rng = self.rng.lock().await;
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let spare = seed_spare(row, &mut rng, now);
                if spare.is_none() {
                    tracing::warn!(row = index + 1, "Skipping spare row without item code");
                }
                spare
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
