//! Machine entities and DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};
use crate::validation::{
    validate_non_negative, validate_not_blank, validate_range, validate_unit_range,
};

/// Lowest accepted `initial_life` percentage.
pub const MIN_INITIAL_LIFE: f64 = 1.0;
/// Highest accepted `initial_life` percentage.
pub const MAX_INITIAL_LIFE: f64 = 100.0;

// ---------------------------------------------------------------------------
// ComponentType
// ---------------------------------------------------------------------------

/// The wear-prone component a machine record tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    #[serde(rename = "Ball Screw")]
    BallScrew,
    #[serde(rename = "LM Guideway")]
    LmGuideway,
    #[serde(rename = "Tool Magazine")]
    ToolMagazine,
    #[serde(rename = "Spindle Motor")]
    SpindleMotor,
}

impl ComponentType {
    /// All component types, in display order.
    pub const ALL: [ComponentType; 4] = [
        ComponentType::BallScrew,
        ComponentType::LmGuideway,
        ComponentType::ToolMagazine,
        ComponentType::SpindleMotor,
    ];

    /// Human-readable label, also used in alert messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BallScrew => "Ball Screw",
            Self::LmGuideway => "LM Guideway",
            Self::ToolMagazine => "Tool Magazine",
            Self::SpindleMotor => "Spindle Motor",
        }
    }

    /// Parse a label produced by [`as_str`](Self::as_str).
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| CoreError::Validation(format!("Unknown component type: {label}")))
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entity and DTOs
// ---------------------------------------------------------------------------

/// A tracked machine component.
///
/// `remaining_life` starts at `initial_life` and is only ever lowered by the
/// degradation simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: EntityId,
    pub name: String,
    pub component_type: ComponentType,
    pub initial_life: f64,
    pub remaining_life: f64,
    pub operating_hours: f64,
    pub load_factor: f64,
    /// Replacement cost in INR.
    pub replacement_cost: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Machine {
    /// Build a new machine record from a create DTO.
    pub fn from_create(id: EntityId, input: CreateMachine, now: Timestamp) -> Self {
        Self {
            id,
            name: input.name,
            component_type: input.component_type,
            initial_life: input.initial_life,
            remaining_life: input.initial_life,
            operating_hours: input.operating_hours,
            load_factor: input.load_factor,
            replacement_cost: input.replacement_cost,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the supplied fields into this record and bump `updated_at`.
    ///
    /// Life values are not part of [`UpdateMachine`] and are left untouched.
    pub fn apply_update(&mut self, update: &UpdateMachine, now: Timestamp) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(component_type) = update.component_type {
            self.component_type = component_type;
        }
        if let Some(hours) = update.operating_hours {
            self.operating_hours = hours;
        }
        if let Some(load) = update.load_factor {
            self.load_factor = load;
        }
        if let Some(cost) = update.replacement_cost {
            self.replacement_cost = cost;
        }
        self.updated_at = now;
    }
}

/// DTO for creating a machine.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMachine {
    pub name: String,
    pub component_type: ComponentType,
    pub initial_life: f64,
    pub operating_hours: f64,
    pub load_factor: f64,
    pub replacement_cost: f64,
}

/// DTO for an administrative machine edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMachine {
    pub name: Option<String>,
    pub component_type: Option<ComponentType>,
    pub operating_hours: Option<f64>,
    pub load_factor: Option<f64>,
    pub replacement_cost: Option<f64>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a create DTO against the machine invariants.
pub fn validate_create_machine(input: &CreateMachine) -> Result<(), CoreError> {
    validate_not_blank(&input.name, "name")?;
    validate_range(
        input.initial_life,
        MIN_INITIAL_LIFE,
        MAX_INITIAL_LIFE,
        "initial_life",
    )?;
    validate_non_negative(input.operating_hours, "operating_hours")?;
    validate_unit_range(input.load_factor, "load_factor")?;
    validate_non_negative(input.replacement_cost, "replacement_cost")
}

/// Validate the fields present in an update DTO.
pub fn validate_update_machine(update: &UpdateMachine) -> Result<(), CoreError> {
    if let Some(name) = &update.name {
        validate_not_blank(name, "name")?;
    }
    if let Some(hours) = update.operating_hours {
        validate_non_negative(hours, "operating_hours")?;
    }
    if let Some(load) = update.load_factor {
        validate_unit_range(load, "load_factor")?;
    }
    if let Some(cost) = update.replacement_cost {
        validate_non_negative(cost, "replacement_cost")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
