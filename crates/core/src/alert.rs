//! Alert records raised when an asset crosses a safety or inventory threshold.

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Timestamp};

/// Severity level of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

/// What kind of condition raised the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    /// Remaining life fell below the critical threshold.
    Wear,
    /// Stock fell below the reorder level.
    Stock,
    Maintenance,
}

/// The single entity an alert refers to.
///
/// Serializes as `{"machine_id": ...}` or `{"spare_id": ...}` so exactly one
/// of the two keys is ever present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertSubject {
    #[serde(rename = "machine_id")]
    Machine(EntityId),
    #[serde(rename = "spare_id")]
    Spare(EntityId),
}

impl AlertSubject {
    pub fn machine_id(&self) -> Option<EntityId> {
        match self {
            Self::Machine(id) => Some(*id),
            Self::Spare(_) => None,
        }
    }

    pub fn spare_id(&self) -> Option<EntityId> {
        match self {
            Self::Spare(id) => Some(*id),
            Self::Machine(_) => None,
        }
    }
}

/// A persisted alert.
///
/// Alerts are append-only. `sent_via_whatsapp` starts `false` and is written
/// once when the delivery attempt reports back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: EntityId,
    #[serde(flatten)]
    pub subject: AlertSubject,
    pub message: String,
    pub severity: AlertSeverity,
    pub alert_type: AlertType,
    pub sent_via_whatsapp: bool,
    pub created_at: Timestamp,
}

impl Alert {
    /// Build a new alert record from a create DTO.
    pub fn from_create(id: EntityId, input: CreateAlert, now: Timestamp) -> Self {
        Self {
            id,
            subject: input.subject,
            message: input.message,
            severity: input.severity,
            alert_type: input.alert_type,
            sent_via_whatsapp: input.sent_via_whatsapp,
            created_at: now,
        }
    }
}

/// DTO for creating an alert.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateAlert {
    pub subject: AlertSubject,
    pub message: String,
    pub severity: AlertSeverity,
    pub alert_type: AlertType,
    #[serde(default)]
    pub sent_via_whatsapp: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::new_id;

    #[test]
    fn alert_serializes_exactly_one_subject_key() {
        let machine_id = new_id();
        let alert = Alert::from_create(
            new_id(),
            CreateAlert {
                subject: AlertSubject::Machine(machine_id),
                message: "VMC-01 below threshold".to_string(),
                severity: AlertSeverity::Critical,
                alert_type: AlertType::Wear,
                sent_via_whatsapp: false,
            },
            Utc::now(),
        );

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["machine_id"], machine_id.to_string());
        assert!(json.get("spare_id").is_none());
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["alert_type"], "wear");
    }

    #[test]
    fn subject_accessors() {
        let id = new_id();
        let subject = AlertSubject::Spare(id);
        assert_eq!(subject.spare_id(), Some(id));
        assert_eq!(subject.machine_id(), None);
    }
}
