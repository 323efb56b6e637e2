//! Critical spare entities and DTOs.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};
use crate::validation::{validate_non_negative, validate_not_blank, validate_range};

/// Expected life used when nothing better is known: one year of hours.
pub const DEFAULT_EXPECTED_LIFE_HOURS: u32 = 8760;

/// Replacement cost used when a spare is created without one (INR).
pub const DEFAULT_REPLACEMENT_COST_INR: f64 = 10_000.0;

/// Load factor used when a spare is created without one.
pub const DEFAULT_LOAD_FACTOR: f64 = 1.0;

/// A wear-prone spare part held in inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalSpare {
    pub id: EntityId,
    pub item_code: String,
    pub item_description: String,
    pub unit: String,
    pub min_stock: u32,
    pub reorder_level: u32,
    pub quantity_in_hand: u32,
    pub machine_type: String,
    pub operating_hours: u64,
    pub load_factor: f64,
    pub wear_percentage: f64,
    pub expected_life_hours: u32,
    pub last_maintenance_date: Option<Timestamp>,
    pub predicted_replacement_date: Option<Timestamp>,
    pub replacement_cost_inr: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CriticalSpare {
    /// Build a new spare record from a create DTO.
    pub fn from_create(id: EntityId, input: CreateSpare, now: Timestamp) -> Self {
        Self {
            id,
            item_code: input.item_code,
            item_description: input.item_description,
            unit: input.unit,
            min_stock: input.min_stock,
            reorder_level: input.reorder_level,
            quantity_in_hand: input.quantity_in_hand,
            machine_type: input.machine_type,
            operating_hours: input.operating_hours,
            load_factor: input.load_factor,
            wear_percentage: input.wear_percentage,
            expected_life_hours: input.expected_life_hours,
            last_maintenance_date: input.last_maintenance_date,
            predicted_replacement_date: input.predicted_replacement_date,
            replacement_cost_inr: input.replacement_cost_inr,
            created_at: now,
            updated_at: now,
        }
    }

    /// Remaining life percentage: `100 - wear`, clamped to `[0, 100]`.
    pub fn remaining_life(&self) -> f64 {
        (100.0 - self.wear_percentage).clamp(0.0, 100.0)
    }

    /// Whether stock has dropped below the reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.quantity_in_hand < self.reorder_level
    }

    /// Merge the supplied fields into this record and bump `updated_at`.
    pub fn apply_update(&mut self, update: &UpdateSpare, now: Timestamp) {
        if let Some(v) = &update.item_description {
            self.item_description = v.clone();
        }
        if let Some(v) = &update.unit {
            self.unit = v.clone();
        }
        if let Some(v) = update.min_stock {
            self.min_stock = v;
        }
        if let Some(v) = update.reorder_level {
            self.reorder_level = v;
        }
        if let Some(v) = update.quantity_in_hand {
            self.quantity_in_hand = v;
        }
        if let Some(v) = &update.machine_type {
            self.machine_type = v.clone();
        }
        if let Some(v) = update.operating_hours {
            self.operating_hours = v;
        }
        if let Some(v) = update.load_factor {
            self.load_factor = v;
        }
        if let Some(v) = update.wear_percentage {
            self.wear_percentage = v;
        }
        if let Some(v) = update.expected_life_hours {
            self.expected_life_hours = v;
        }
        if let Some(v) = update.last_maintenance_date {
            self.last_maintenance_date = v;
        }
        if let Some(v) = update.predicted_replacement_date {
            self.predicted_replacement_date = v;
        }
        if let Some(v) = update.replacement_cost_inr {
            self.replacement_cost_inr = v;
        }
        self.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a spare, either directly or from an imported row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpare {
    pub item_code: String,
    pub item_description: String,
    pub unit: String,
    pub min_stock: u32,
    pub reorder_level: u32,
    pub quantity_in_hand: u32,
    pub machine_type: String,
    #[serde(default)]
    pub operating_hours: u64,
    #[serde(default = "default_load_factor")]
    pub load_factor: f64,
    #[serde(default)]
    pub wear_percentage: f64,
    #[serde(default = "default_expected_life_hours")]
    pub expected_life_hours: u32,
    #[serde(default)]
    pub last_maintenance_date: Option<Timestamp>,
    #[serde(default)]
    pub predicted_replacement_date: Option<Timestamp>,
    #[serde(default = "default_replacement_cost")]
    pub replacement_cost_inr: f64,
}

fn default_load_factor() -> f64 {
    DEFAULT_LOAD_FACTOR
}

fn default_expected_life_hours() -> u32 {
    DEFAULT_EXPECTED_LIFE_HOURS
}

fn default_replacement_cost() -> f64 {
    DEFAULT_REPLACEMENT_COST_INR
}

/// DTO for a partial spare update. The item code cannot be changed.
///
/// Nullable date fields use a double option: `None` leaves the value alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSpare {
    pub item_description: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<u32>,
    pub reorder_level: Option<u32>,
    pub quantity_in_hand: Option<u32>,
    pub machine_type: Option<String>,
    pub operating_hours: Option<u64>,
    pub load_factor: Option<f64>,
    pub wear_percentage: Option<f64>,
    pub expected_life_hours: Option<u32>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_maintenance_date: Option<Option<Timestamp>>,
    #[serde(default, deserialize_with = "double_option")]
    pub predicted_replacement_date: Option<Option<Timestamp>>,
    pub replacement_cost_inr: Option<f64>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a create DTO against the spare invariants.
pub fn validate_create_spare(input: &CreateSpare) -> Result<(), CoreError> {
    validate_not_blank(&input.item_code, "item_code")?;
    validate_non_negative(input.load_factor, "load_factor")?;
    validate_range(input.wear_percentage, 0.0, 100.0, "wear_percentage")?;
    validate_expected_life(input.expected_life_hours)?;
    validate_non_negative(input.replacement_cost_inr, "replacement_cost_inr")
}

/// Validate the fields present in an update DTO.
pub fn validate_update_spare(update: &UpdateSpare) -> Result<(), CoreError> {
    if let Some(load) = update.load_factor {
        validate_non_negative(load, "load_factor")?;
    }
    if let Some(wear) = update.wear_percentage {
        validate_range(wear, 0.0, 100.0, "wear_percentage")?;
    }
    if let Some(hours) = update.expected_life_hours {
        validate_expected_life(hours)?;
    }
    if let Some(cost) = update.replacement_cost_inr {
        validate_non_negative(cost, "replacement_cost_inr")?;
    }
    Ok(())
}

fn validate_expected_life(hours: u32) -> Result<(), CoreError> {
    if hours == 0 {
        return Err(CoreError::Validation(
            "expected_life_hours must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::new_id;

    fn spare(wear: f64, qty: u32, reorder: u32) -> CriticalSpare {
        let input: CreateSpare = serde_json::from_value(serde_json::json!({
            "item_code": "BRG-6205",
            "item_description": "Deep groove ball bearing 6205",
            "unit": "Nos",
            "min_stock": 1,
            "reorder_level": reorder,
            "quantity_in_hand": qty,
            "machine_type": "CNC",
            "wear_percentage": wear,
        }))
        .unwrap();
        CriticalSpare::from_create(new_id(), input, Utc::now())
    }

    #[test]
    fn create_dto_fills_defaults() {
        let s = spare(0.0, 4, 2);
        assert_eq!(s.load_factor, DEFAULT_LOAD_FACTOR);
        assert_eq!(s.expected_life_hours, DEFAULT_EXPECTED_LIFE_HOURS);
        assert_eq!(s.replacement_cost_inr, DEFAULT_REPLACEMENT_COST_INR);
        assert_eq!(s.operating_hours, 0);
        assert!(s.last_maintenance_date.is_none());
    }

    #[test]
    fn remaining_life_is_complement_of_wear() {
        assert_eq!(spare(35.0, 4, 2).remaining_life(), 65.0);
        assert_eq!(spare(100.0, 4, 2).remaining_life(), 0.0);
    }

    #[test]
    fn low_stock_is_strictly_below_reorder_level() {
        assert!(!spare(0.0, 2, 2).is_low_stock());
        assert!(spare(0.0, 1, 2).is_low_stock());
    }

    #[test]
    fn update_can_clear_nullable_dates() {
        let mut s = spare(10.0, 4, 2);
        s.predicted_replacement_date = Some(Utc::now());

        let update: UpdateSpare =
            serde_json::from_value(serde_json::json!({ "predicted_replacement_date": null }))
                .unwrap();
        assert_eq!(update.predicted_replacement_date, Some(None));
        assert_eq!(update.last_maintenance_date, None);

        s.apply_update(&update, Utc::now());
        assert!(s.predicted_replacement_date.is_none());
    }

    #[test]
    fn zero_expected_life_is_rejected() {
        let update = UpdateSpare {
            expected_life_hours: Some(0),
            ..Default::default()
        };
        assert!(validate_update_spare(&update).is_err());
    }
}
