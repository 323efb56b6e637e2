//! Maintenance log records and the replacement lifecycle transition.

use serde::{Deserialize, Serialize};

use crate::spare::CriticalSpare;
use crate::types::{EntityId, Timestamp};

/// Performer recorded on logs written by the automated consumption pass.
pub const SYSTEM_PERFORMER: &str = "System Auto-Tracking";

/// Notes recorded on logs written by the automated consumption pass.
pub const AUTO_CONSUMPTION_NOTES: &str = "Automated consumption - real-time usage simulation";

/// Kind of service event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceType {
    Inspection,
    Repair,
    /// Renews the spare: stock is drawn down and wear is reset.
    Replacement,
}

impl MaintenanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inspection => "inspection",
            Self::Repair => "repair",
            Self::Replacement => "replacement",
        }
    }
}

/// A recorded service event against a spare.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceLog {
    pub id: EntityId,
    pub spare_id: EntityId,
    pub maintenance_type: MaintenanceType,
    pub quantity_used: u32,
    pub cost: Option<f64>,
    pub notes: Option<String>,
    pub performed_by: Option<String>,
    pub created_at: Timestamp,
}

impl MaintenanceLog {
    pub fn from_create(id: EntityId, input: CreateMaintenanceLog, now: Timestamp) -> Self {
        Self {
            id,
            spare_id: input.spare_id,
            maintenance_type: input.maintenance_type,
            quantity_used: input.quantity_used,
            cost: input.cost,
            notes: input.notes,
            performed_by: input.performed_by,
            created_at: now,
        }
    }
}

/// DTO for creating a maintenance log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateMaintenanceLog {
    pub spare_id: EntityId,
    pub maintenance_type: MaintenanceType,
    #[serde(default = "default_quantity_used")]
    pub quantity_used: u32,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub performed_by: Option<String>,
}

fn default_quantity_used() -> u32 {
    1
}

impl CreateMaintenanceLog {
    /// The repair log written when the automated pass consumes stock.
    pub fn auto_consumption(spare: &CriticalSpare, quantity_used: u32) -> Self {
        Self {
            spare_id: spare.id,
            maintenance_type: MaintenanceType::Repair,
            quantity_used,
            cost: Some(spare.replacement_cost_inr * 0.1),
            notes: Some(AUTO_CONSUMPTION_NOTES.to_string()),
            performed_by: Some(SYSTEM_PERFORMER.to_string()),
        }
    }
}

/// Apply the replacement transition to a spare.
///
/// Draws `quantity_used` from stock (floored at zero), zeroes operating hours
/// and wear, and stamps the maintenance date. The caller must hold the spare
/// exclusively for the whole call.
pub fn apply_replacement(spare: &mut CriticalSpare, quantity_used: u32, now: Timestamp) {
    spare.quantity_in_hand = spare.quantity_in_hand.saturating_sub(quantity_used);
    spare.operating_hours = 0;
    spare.wear_percentage = 0.0;
    spare.last_maintenance_date = Some(now);
    spare.updated_at = now;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::spare::CreateSpare;
    use crate::types::new_id;

    fn spare(qty: u32) -> CriticalSpare {
        CriticalSpare::from_create(
            new_id(),
            CreateSpare {
                item_code: "SEAL-22".to_string(),
                item_description: "Hydraulic seal kit".to_string(),
                unit: "Set".to_string(),
                min_stock: 1,
                reorder_level: 2,
                quantity_in_hand: qty,
                machine_type: "CNC".to_string(),
                operating_hours: 900,
                load_factor: 1.0,
                wear_percentage: 73.5,
                expected_life_hours: 2190,
                last_maintenance_date: None,
                predicted_replacement_date: None,
                replacement_cost_inr: 2_500.0,
            },
            Utc::now(),
        )
    }

    #[test]
    fn replacement_resets_lifecycle() {
        let mut s = spare(5);
        let now = Utc::now();
        apply_replacement(&mut s, 2, now);

        assert_eq!(s.quantity_in_hand, 3);
        assert_eq!(s.operating_hours, 0);
        assert_eq!(s.wear_percentage, 0.0);
        assert_eq!(s.last_maintenance_date, Some(now));
    }

    #[test]
    fn replacement_floors_stock_at_zero() {
        let mut s = spare(1);
        apply_replacement(&mut s, 4, Utc::now());
        assert_eq!(s.quantity_in_hand, 0);
    }

    #[test]
    fn quantity_used_defaults_to_one() {
        let input: CreateMaintenanceLog = serde_json::from_value(serde_json::json!({
            "spare_id": new_id(),
            "maintenance_type": "inspection",
        }))
        .unwrap();
        assert_eq!(input.quantity_used, 1);
        assert!(input.cost.is_none());
    }

    #[test]
    fn auto_consumption_costs_ten_percent() {
        let s = spare(5);
        let log = CreateMaintenanceLog::auto_consumption(&s, 2);
        assert_eq!(log.maintenance_type, MaintenanceType::Repair);
        assert_eq!(log.cost, Some(250.0));
        assert_eq!(log.performed_by.as_deref(), Some(SYSTEM_PERFORMER));
    }
}
