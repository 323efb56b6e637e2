//! Best-effort alert notifications.
//!
//! [`NotificationDispatcher`] composes a human-readable message from an
//! [`AlertNotice`] and makes a single send attempt. Failures are logged and
//! reported as `false`; they never reach the alerting pipeline as errors.

use std::sync::Arc;

use twinai_core::thresholds::{format_inr, AlertNotice};

use crate::channel::{NotificationChannel, OutboundMessage};

/// Compose the outbound text for an alert notice.
pub fn compose_message(notice: &AlertNotice) -> String {
    let cost = if notice.replacement_cost > 0.0 {
        format!(" Replacement cost: ₹{}", format_inr(notice.replacement_cost))
    } else {
        String::new()
    };
    format!(
        "🚨 CRITICAL ALERT: {}'s {} is below safe threshold at {:.1}%. Immediate maintenance recommended.{cost}",
        notice.subject, notice.description, notice.remaining_life,
    )
}

/// Sends alert notices through an injected channel.
#[derive(Clone)]
pub struct NotificationDispatcher {
    channel: Arc<dyn NotificationChannel>,
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }

    /// The underlying channel, for ad-hoc sends.
    pub fn channel(&self) -> &Arc<dyn NotificationChannel> {
        &self.channel
    }

    /// Deliver one notice. Returns `true` only if the remote side accepted it.
    pub async fn dispatch(&self, notice: &AlertNotice) -> bool {
        self.dispatch_message(&notice.subject, &OutboundMessage::body(compose_message(notice)))
            .await
    }

    /// Deliver a prepared message, logging the outcome under `subject`.
    pub async fn dispatch_message(&self, subject: &str, message: &OutboundMessage) -> bool {
        match self.channel.send(message).await {
            Ok(outcome) if outcome.ok => {
                tracing::info!(subject, "Alert notification sent");
                true
            }
            Ok(outcome) => {
                tracing::warn!(
                    subject,
                    status = outcome.status,
                    status_text = %outcome.status_text,
                    "Alert notification rejected"
                );
                false
            }
            Err(e) => {
                tracing::warn!(subject, error = %e, "Alert notification failed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(cost: f64) -> AlertNotice {
        AlertNotice {
            subject: "VMC-07".to_string(),
            description: "Ball Screw".to_string(),
            remaining_life: 12.345,
            replacement_cost: cost,
        }
    }

    #[test]
    fn message_includes_cost_when_known() {
        assert_eq!(
            compose_message(&notice(45_000.0)),
            "🚨 CRITICAL ALERT: VMC-07's Ball Screw is below safe threshold at 12.3%. \
             Immediate maintenance recommended. Replacement cost: ₹45,000"
        );
    }

    #[test]
    fn message_omits_zero_cost() {
        assert!(compose_message(&notice(0.0)).ends_with("Immediate maintenance recommended."));
    }
}
