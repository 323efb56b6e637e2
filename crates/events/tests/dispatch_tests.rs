//! Dispatcher behaviour against fake channels.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use twinai_core::thresholds::AlertNotice;
use twinai_events::{
    ChannelError, DeliveryOutcome, DisabledChannel, MessageContent, NotificationChannel,
    NotificationDispatcher, OutboundMessage,
};

// ---------------------------------------------------------------------------
// Fake channels
// ---------------------------------------------------------------------------

/// Records every message and answers with a fixed HTTP status.
struct RecordingChannel {
    status: u16,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingChannel {
    fn new(status: u16) -> Self {
        Self {
            status,
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryOutcome, ChannelError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(DeliveryOutcome {
            ok: (200..300).contains(&self.status),
            status: self.status,
            status_text: String::new(),
            response_text: String::new(),
        })
    }
}

fn notice() -> AlertNotice {
    AlertNotice {
        subject: "HMC-02".to_string(),
        description: "Spindle Motor".to_string(),
        remaining_life: 4.0,
        replacement_cost: 120_000.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// An accepted send reports `true` and carries the composed body.
#[tokio::test]
async fn accepted_send_reports_success() {
    let channel = Arc::new(RecordingChannel::new(201));
    let dispatcher = NotificationDispatcher::new(channel.clone());

    assert!(dispatcher.dispatch(&notice()).await);

    let sent = channel.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    match &sent[0].content {
        MessageContent::Body(text) => {
            assert!(text.contains("HMC-02's Spindle Motor"));
            assert!(text.contains("4.0%"));
            assert!(text.ends_with("Replacement cost: ₹120,000"));
        }
        other => panic!("unexpected content: {other:?}"),
    }
}

/// A non-success status is a failed delivery, attempted exactly once.
#[tokio::test]
async fn rejected_send_is_not_retried() {
    let channel = Arc::new(RecordingChannel::new(401));
    let dispatcher = NotificationDispatcher::new(channel.clone());

    assert!(!dispatcher.dispatch(&notice()).await);
    assert_eq!(channel.sent.lock().unwrap().len(), 1);
}

/// A channel error is swallowed.
#[tokio::test]
async fn channel_error_reports_false() {
    let dispatcher = NotificationDispatcher::new(Arc::new(DisabledChannel::new("unset")));
    assert!(!dispatcher.dispatch(&notice()).await);
}
