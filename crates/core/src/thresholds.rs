//! Threshold evaluation rules for machines and spares.
//!
//! Pure logic: the caller passes in post-tick state and persists whatever
//! [`AlertDraft`]s come back. Threshold crossings are ordinary business
//! states, so nothing in here returns an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::alert::{AlertSeverity, AlertSubject, AlertType, CreateAlert};
use crate::machine::Machine;
use crate::spare::CriticalSpare;

/// Remaining-life percentage below which an asset is critical.
pub const CRITICAL_LIFE_THRESHOLD: f64 = 20.0;

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// The content handed to the notification dispatcher for one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotice {
    /// Machine name or spare item code.
    pub subject: String,
    /// Component type or spare description.
    pub description: String,
    pub remaining_life: f64,
    /// Replacement cost in INR.
    pub replacement_cost: f64,
}

/// An alert ready to persist, plus the notice to deliver once it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub alert: CreateAlert,
    pub notice: AlertNotice,
}

/// Format an INR amount with thousands separators, e.g. `45,000` or `1,234.5`.
pub fn format_inr(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    match frac {
        0 => format!("{sign}{grouped}"),
        f if f % 10 == 0 => format!("{sign}{grouped}.{}", f / 10),
        f => format!("{sign}{grouped}.{f:02}"),
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Evaluate a machine. Raises a critical wear alert below the threshold.
pub fn evaluate_machine(machine: &Machine) -> Option<AlertDraft> {
    if machine.remaining_life >= CRITICAL_LIFE_THRESHOLD {
        return None;
    }

    let message = format!(
        "🚨 URGENT: {}'s {} at {:.1}% life. Replace immediately! Cost: ₹{}",
        machine.name,
        machine.component_type,
        machine.remaining_life,
        format_inr(machine.replacement_cost),
    );

    Some(AlertDraft {
        alert: CreateAlert {
            subject: AlertSubject::Machine(machine.id),
            message,
            severity: AlertSeverity::Critical,
            alert_type: AlertType::Wear,
            sent_via_whatsapp: false,
        },
        notice: AlertNotice {
            subject: machine.name.clone(),
            description: machine.component_type.to_string(),
            remaining_life: machine.remaining_life,
            replacement_cost: machine.replacement_cost,
        },
    })
}

/// Evaluate a spare.
///
/// Low remaining life wins over low stock: a worn spare raises a critical
/// wear alert, otherwise a stock shortfall raises a warning stock alert.
pub fn evaluate_spare(spare: &CriticalSpare) -> Option<AlertDraft> {
    let remaining_life = spare.remaining_life();
    let is_worn = remaining_life < CRITICAL_LIFE_THRESHOLD;

    let (severity, alert_type, message) = if is_worn {
        (
            AlertSeverity::Critical,
            AlertType::Wear,
            format!(
                "🔧 CRITICAL: {} ({}) has {:.1}% life remaining. Immediate replacement needed! Cost: ₹{}",
                spare.item_description,
                spare.item_code,
                remaining_life,
                format_inr(spare.replacement_cost_inr),
            ),
        )
    } else if spare.is_low_stock() {
        (
            AlertSeverity::Warning,
            AlertType::Stock,
            format!(
                "📦 STOCK ALERT: {} ({}) has only {} units left (reorder level {}). Reorder now! Cost: ₹{}",
                spare.item_description,
                spare.item_code,
                spare.quantity_in_hand,
                spare.reorder_level,
                format_inr(spare.replacement_cost_inr),
            ),
        )
    } else {
        return None;
    };

    Some(AlertDraft {
        alert: CreateAlert {
            subject: AlertSubject::Spare(spare.id),
            message,
            severity,
            alert_type,
            sent_via_whatsapp: false,
        },
        notice: AlertNotice {
            subject: spare.item_code.clone(),
            description: spare.item_description.clone(),
            remaining_life,
            replacement_cost: spare.replacement_cost_inr,
        },
    })
}

// ---------------------------------------------------------------------------
// Alert policy
// ---------------------------------------------------------------------------

/// How repeated evaluations of a still-active condition are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Every pass in which the condition holds raises a new alert.
    #[default]
    EveryPass,
    /// One alert per crossing; suppressed while active, re-armed on recovery.
    EdgeTriggered,
}

impl AlertPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "every_pass" => Some(Self::EveryPass),
            "edge_triggered" => Some(Self::EdgeTriggered),
            _ => None,
        }
    }
}

/// Tracks which subjects currently have an active condition, and of which type.
///
/// Under [`AlertPolicy::EveryPass`] the gate lets every draft through and
/// keeps no state.
#[derive(Debug, Default)]
pub struct AlertGate {
    policy: AlertPolicy,
    active: HashMap<AlertSubject, AlertType>,
}

impl AlertGate {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            policy,
            active: HashMap::new(),
        }
    }

    pub fn policy(&self) -> AlertPolicy {
        self.policy
    }

    /// Filter the evaluation result for one subject.
    ///
    /// `draft` is what the rules produced this pass; `None` means the subject
    /// is healthy, which re-arms it.
    pub fn admit(&mut self, subject: AlertSubject, draft: Option<AlertDraft>) -> Option<AlertDraft> {
        let Some(draft) = draft else {
            self.active.remove(&subject);
            return None;
        };

        if self.policy == AlertPolicy::EveryPass {
            return Some(draft);
        }

        match self.active.insert(subject, draft.alert.alert_type) {
            Some(previous) if previous == draft.alert.alert_type => None,
            _ => Some(draft),
        }
    }

    /// Drop any state for a deleted subject.
    pub fn forget(&mut self, subject: &AlertSubject) {
        self.active.remove(subject);
    }
}

/// Evaluate a batch of machines through the gate.
pub fn evaluate_machines(machines: &[Machine], gate: &mut AlertGate) -> Vec<AlertDraft> {
    machines
        .iter()
        .filter_map(|m| gate.admit(AlertSubject::Machine(m.id), evaluate_machine(m)))
        .collect()
}

/// Evaluate a batch of spares through the gate.
pub fn evaluate_spares(spares: &[CriticalSpare], gate: &mut AlertGate) -> Vec<AlertDraft> {
    spares
        .iter()
        .filter_map(|s| gate.admit(AlertSubject::Spare(s.id), evaluate_spare(s)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::machine::{ComponentType, CreateMachine};
    use crate::spare::CreateSpare;
    use crate::types::new_id;

    fn machine(remaining_life: f64) -> Machine {
        let mut m = Machine::from_create(
            new_id(),
            CreateMachine {
                name: "VMC-07".to_string(),
                component_type: ComponentType::LmGuideway,
                initial_life: 100.0,
                operating_hours: 10.0,
                load_factor: 0.5,
                replacement_cost: 45_000.0,
            },
            Utc::now(),
        );
        m.remaining_life = remaining_life;
        m
    }

    fn spare(wear: f64, qty: u32, reorder: u32) -> CriticalSpare {
        CriticalSpare::from_create(
            new_id(),
            CreateSpare {
                item_code: "BLT-A42".to_string(),
                item_description: "V belt A42".to_string(),
                unit: "Nos".to_string(),
                min_stock: 1,
                reorder_level: reorder,
                quantity_in_hand: qty,
                machine_type: "CNC".to_string(),
                operating_hours: 0,
                load_factor: 1.0,
                wear_percentage: wear,
                expected_life_hours: 4380,
                last_maintenance_date: None,
                predicted_replacement_date: None,
                replacement_cost_inr: 1_850.0,
            },
            Utc::now(),
        )
    }

    #[test]
    fn healthy_machine_raises_nothing() {
        assert!(evaluate_machine(&machine(20.0)).is_none());
    }

    #[test]
    fn worn_machine_raises_critical_wear() {
        let m = machine(15.04);
        let draft = evaluate_machine(&m).expect("below threshold");
        assert_eq!(draft.alert.severity, AlertSeverity::Critical);
        assert_eq!(draft.alert.alert_type, AlertType::Wear);
        assert_eq!(draft.alert.subject, AlertSubject::Machine(m.id));
        assert!(draft.alert.message.contains("VMC-07's LM Guideway at 15.0% life"));
        assert!(draft.alert.message.contains("₹45,000"));
        assert_eq!(draft.notice.subject, "VMC-07");
    }

    #[test]
    fn worn_spare_takes_precedence_over_low_stock() {
        let draft = evaluate_spare(&spare(85.0, 0, 2)).expect("worn");
        assert_eq!(draft.alert.alert_type, AlertType::Wear);
        assert_eq!(draft.alert.severity, AlertSeverity::Critical);
        assert!(draft.alert.message.contains("15.0% life remaining"));
    }

    #[test]
    fn low_stock_spare_raises_warning() {
        let draft = evaluate_spare(&spare(10.0, 1, 2)).expect("low stock");
        assert_eq!(draft.alert.alert_type, AlertType::Stock);
        assert_eq!(draft.alert.severity, AlertSeverity::Warning);
        assert!(draft.alert.message.contains("only 1 units left"));
        assert!(draft.alert.message.contains("₹1,850"));
    }

    #[test]
    fn stock_at_reorder_level_is_fine() {
        assert!(evaluate_spare(&spare(10.0, 2, 2)).is_none());
    }

    #[test]
    fn inr_formatting() {
        assert_eq!(format_inr(0.0), "0");
        assert_eq!(format_inr(999.0), "999");
        assert_eq!(format_inr(1_234_567.0), "1,234,567");
        assert_eq!(format_inr(12_345.5), "12,345.5");
        assert_eq!(format_inr(7_000.256), "7,000.26");
    }

    #[test]
    fn every_pass_repeats_alerts() {
        let mut gate = AlertGate::new(AlertPolicy::EveryPass);
        let m = machine(5.0);
        assert_eq!(evaluate_machines(std::slice::from_ref(&m), &mut gate).len(), 1);
        assert_eq!(evaluate_machines(std::slice::from_ref(&m), &mut gate).len(), 1);
    }

    #[test]
    fn edge_triggered_suppresses_until_recovery() {
        let mut gate = AlertGate::new(AlertPolicy::EdgeTriggered);
        let mut m = machine(5.0);

        assert_eq!(evaluate_machines(std::slice::from_ref(&m), &mut gate).len(), 1);
        assert!(evaluate_machines(std::slice::from_ref(&m), &mut gate).is_empty());

        m.remaining_life = 50.0;
        assert!(evaluate_machines(std::slice::from_ref(&m), &mut gate).is_empty());

        m.remaining_life = 10.0;
        assert_eq!(evaluate_machines(std::slice::from_ref(&m), &mut gate).len(), 1);
    }

    #[test]
    fn edge_triggered_fires_again_when_condition_type_changes() {
        let mut gate = AlertGate::new(AlertPolicy::EdgeTriggered);
        let mut s = spare(10.0, 1, 2);

        let first = evaluate_spares(std::slice::from_ref(&s), &mut gate);
        assert_eq!(first[0].alert.alert_type, AlertType::Stock);

        s.wear_percentage = 90.0;
        let second = evaluate_spares(std::slice::from_ref(&s), &mut gate);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].alert.alert_type, AlertType::Wear);
    }

    #[test]
    fn policy_parses_config_values() {
        assert_eq!(AlertPolicy::parse("edge_triggered"), Some(AlertPolicy::EdgeTriggered));
        assert_eq!(AlertPolicy::parse(" EVERY_PASS "), Some(AlertPolicy::EveryPass));
        assert_eq!(AlertPolicy::parse("sometimes"), None);
    }
}
