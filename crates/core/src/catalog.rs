//! Keyword catalog for spare life and cost estimates, and seed-row derivation.
//!
//! Imported spare rows carry only inventory data. Expected life and
//! replacement cost are inferred from keywords in the item description, and
//! the initial wear state is randomized so a fresh process has a spread of
//! spares to simulate.

use crate::rng::SimRng;
use crate::spare::CreateSpare;
use crate::types::Timestamp;
use crate::wear::predict_replacement_date;

/// Upper bound (exclusive) for randomized initial operating hours.
pub const SEED_MAX_OPERATING_HOURS: u64 = 5_000;
/// Randomized initial load factor range.
pub const SEED_LOAD_FACTOR: (f64, f64) = (0.8, 1.2);
/// Randomized initial wear range.
pub const SEED_WEAR_PERCENTAGE: (f64, f64) = (0.0, 100.0);

const DEFAULT_MIN_STOCK: u32 = 1;
const DEFAULT_REORDER_LEVEL: u32 = 2;
const DEFAULT_MACHINE_TYPE: &str = "CNC";

// ---------------------------------------------------------------------------
// PartClass
// ---------------------------------------------------------------------------

/// Coarse part family inferred from a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartClass {
    Bearing,
    Gear,
    BeltOrCoupling,
    SensorOrSwitch,
    SealOrWiper,
    MotorOrPump,
    Other,
}

/// Keyword table, checked in order; the first hit wins.
const KEYWORDS: &[(&[&str], PartClass)] = &[
    (&["bearing"], PartClass::Bearing),
    (&["gear"], PartClass::Gear),
    (&["belt", "coupling"], PartClass::BeltOrCoupling),
    (&["sensor", "switch"], PartClass::SensorOrSwitch),
    (&["seal", "wiper"], PartClass::SealOrWiper),
    (&["motor", "pump"], PartClass::MotorOrPump),
];

impl PartClass {
    /// Classify a free-text item description.
    pub fn classify(description: &str) -> Self {
        let desc = description.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|w| desc.contains(w)))
            .map_or(Self::Other, |(_, class)| *class)
    }

    /// Expected service life in operating hours.
    pub fn expected_life_hours(&self) -> u32 {
        match self {
            Self::Bearing | Self::Other => 8_760,
            Self::Gear => 17_520,
            Self::BeltOrCoupling => 4_380,
            Self::SensorOrSwitch => 26_280,
            Self::SealOrWiper => 2_190,
            Self::MotorOrPump => 35_040,
        }
    }
}

/// Replacement cost bands in INR, `[low, high)`. Checked in order, separately
/// from the life table; the first hit wins.
const COST_BANDS: &[(&[&str], (f64, f64))] = &[
    (&["bearing"], (5_000.0, 15_000.0)),
    (&["gear"], (15_000.0, 40_000.0)),
    (&["motor", "pump"], (25_000.0, 75_000.0)),
    (&["sensor", "switch"], (3_000.0, 10_000.0)),
    (&["seal", "belt"], (1_000.0, 5_000.0)),
];

const DEFAULT_COST_BAND: (f64, f64) = (5_000.0, 15_000.0);

/// Replacement cost band for a free-text item description.
pub fn cost_band(description: &str) -> (f64, f64) {
    let desc = description.to_lowercase();
    COST_BANDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| desc.contains(w)))
        .map_or(DEFAULT_COST_BAND, |(_, band)| *band)
}

// ---------------------------------------------------------------------------
// Seed rows
// ---------------------------------------------------------------------------

/// One raw row of the spare inventory data source.
///
/// Numeric columns are kept as text; blank, zero or unparsable values fall
/// back to defaults during derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpareRow {
    pub item_code: String,
    pub item_description: String,
    pub unit: String,
    pub min_stock: String,
    pub reorder_level: String,
    pub existing_stock: String,
    pub status: String,
}

/// Parse the leading integer of a cell, so `"3 Nos"` reads as 3. `None` for
/// blank, zero or non-numeric cells.
fn parse_count(cell: &str) -> Option<u32> {
    let cell = cell.trim_start();
    let digits = cell.find(|c: char| !c.is_ascii_digit()).unwrap_or(cell.len());
    let value = match cell[..digits].parse::<u64>() {
        Ok(value) => value,
        // More digits than fit in a u64.
        Err(_) if digits > 0 => u64::MAX,
        Err(_) => return None,
    };
    (value > 0).then(|| u32::try_from(value).unwrap_or(u32::MAX))
}

/// Derive a spare from an imported row.
///
/// Returns `None` when the row has no item code.
pub fn seed_spare(row: &SpareRow, rng: &mut SimRng, now: Timestamp) -> Option<CreateSpare> {
    let item_code = row.item_code.trim();
    if item_code.is_empty() {
        return None;
    }

    let class = PartClass::classify(&row.item_description);
    let expected_life_hours = class.expected_life_hours();
    let (cost_low, cost_high) = cost_band(&row.item_description);

    let operating_hours = rng.below(SEED_MAX_OPERATING_HOURS);
    let load_factor = rng.uniform(SEED_LOAD_FACTOR.0, SEED_LOAD_FACTOR.1);
    let wear_percentage = rng.uniform(SEED_WEAR_PERCENTAGE.0, SEED_WEAR_PERCENTAGE.1);
    let replacement_cost_inr = rng.uniform(cost_low, cost_high);

    let machine_type = match row.status.trim() {
        "" => DEFAULT_MACHINE_TYPE.to_string(),
        status => status.to_string(),
    };

    Some(CreateSpare {
        item_code: item_code.to_string(),
        item_description: row.item_description.trim().to_string(),
        unit: row.unit.trim().to_string(),
        min_stock: parse_count(&row.min_stock).unwrap_or(DEFAULT_MIN_STOCK),
        reorder_level: parse_count(&row.reorder_level).unwrap_or(DEFAULT_REORDER_LEVEL),
        quantity_in_hand: parse_count(&row.existing_stock).unwrap_or(0),
        machine_type,
        operating_hours,
        load_factor,
        wear_percentage,
        expected_life_hours,
        last_maintenance_date: None,
        predicted_replacement_date: predict_replacement_date(
            expected_life_hours,
            wear_percentage,
            now,
        ),
        replacement_cost_inr,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
