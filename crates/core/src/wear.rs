//! Wear-advancement math for machines and spares.
//!
//! Pure functions; the simulator supplies the clock and the random hour
//! increments so every step here is deterministic.

use chrono::Duration;

use crate::machine::Machine;
use crate::spare::CriticalSpare;
use crate::types::Timestamp;

/// Fraction of `operating_hours * load_factor` removed from machine life per tick.
pub const MACHINE_WEAR_RATE: f64 = 0.05;

/// Largest random hour increment applied to a spare in one tick (about a week).
pub const MAX_TICK_HOURS: u32 = 167;

/// Assumed utilisation when projecting a replacement date.
pub const OPERATING_HOURS_PER_DAY: f64 = 8.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Life removed from a machine by one tick.
pub fn machine_wear_amount(machine: &Machine) -> f64 {
    machine.operating_hours * machine.load_factor * MACHINE_WEAR_RATE
}

/// Advance one machine by a single tick.
///
/// `remaining_life` never drops below zero and never rises. Operating hours
/// are a fixed attribute of the machine and are not accumulated here.
pub fn advance_machine(machine: &mut Machine, now: Timestamp) {
    let wear = machine_wear_amount(machine);
    machine.remaining_life = (machine.remaining_life - wear).max(0.0);
    machine.updated_at = now;
}

/// Wear percentage added per operating hour for a given expected life.
pub fn hourly_wear_rate(expected_life_hours: u32) -> f64 {
    100.0 / f64::from(expected_life_hours.max(1))
}

/// Advance one spare by a single tick of `additional_hours`.
///
/// Accumulates hours, adds load-scaled wear capped at 100 and recomputes the
/// predicted replacement date.
pub fn advance_spare(spare: &mut CriticalSpare, additional_hours: u32, now: Timestamp) {
    let additional_wear =
        hourly_wear_rate(spare.expected_life_hours) * f64::from(additional_hours) * spare.load_factor;

    spare.operating_hours = spare.operating_hours.saturating_add(u64::from(additional_hours));
    spare.wear_percentage = (spare.wear_percentage + additional_wear).min(100.0);
    spare.predicted_replacement_date =
        predict_replacement_date(spare.expected_life_hours, spare.wear_percentage, now);
    spare.updated_at = now;
}

/// Project when a spare will need replacing.
///
/// Returns `None` once the spare is fully worn. Otherwise the remaining hours
/// are spread over [`OPERATING_HOURS_PER_DAY`], with a floor of one day.
/// Projections past the calendar's range clamp to its last instant.
pub fn predict_replacement_date(
    expected_life_hours: u32,
    wear_percentage: f64,
    now: Timestamp,
) -> Option<Timestamp> {
    let remaining_life = 100.0 - wear_percentage;
    if remaining_life <= 0.0 {
        return None;
    }

    let remaining_hours = f64::from(expected_life_hours) * remaining_life / 100.0;
    let days = (remaining_hours / OPERATING_HOURS_PER_DAY).max(1.0);
    let projected = Duration::try_milliseconds((days * MILLIS_PER_DAY) as i64)
        .and_then(|ahead| now.checked_add_signed(ahead))
        .unwrap_or(Timestamp::MAX_UTC);
    Some(projected)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
