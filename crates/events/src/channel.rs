//! The outbound notification seam.
//!
//! The alerting pipeline only ever talks to a [`NotificationChannel`], so the
//! simulation core can run and be tested without any network dependency.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// What to send: free text or a pre-approved template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageContent {
    Body(String),
    Template {
        content_sid: String,
        /// Template placeholders, keyed by position (`"1"`, `"2"`, ...) or name.
        #[serde(default)]
        variables: BTreeMap<String, serde_json::Value>,
    },
}

/// A single message to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Recipient. `None` falls back to the channel's default recipient.
    #[serde(default)]
    pub to: Option<String>,
    pub content: MessageContent,
}

impl OutboundMessage {
    /// A free-text message to the channel's default recipient.
    pub fn body(text: impl Into<String>) -> Self {
        Self {
            to: None,
            content: MessageContent::Body(text.into()),
        }
    }

    /// `true` when there is nothing to send.
    pub fn is_empty(&self) -> bool {
        match &self.content {
            MessageContent::Body(text) => text.trim().is_empty(),
            MessageContent::Template { content_sid, .. } => content_sid.trim().is_empty(),
        }
    }
}

/// Result of one delivery attempt as reported by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub response_text: String,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a message could not be handed to the remote side.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Credentials or sender are missing.
    #[error("Notification channel not configured: {0}")]
    NotConfigured(String),

    /// No recipient on the message and no default configured.
    #[error("No recipient provided and no default recipient configured")]
    MissingRecipient,

    /// Neither a body nor a template reference was provided.
    #[error("Either a message body or a template content SID must be provided")]
    EmptyMessage,

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Channel trait
// ---------------------------------------------------------------------------

/// Sends a message and reports the outcome. Implementations make exactly one
/// attempt per call.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryOutcome, ChannelError>;
}

/// Channel used when no credentials are configured. Every send fails with
/// [`ChannelError::NotConfigured`].
#[derive(Debug, Clone, Default)]
pub struct DisabledChannel {
    reason: String,
}

impl DisabledChannel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl NotificationChannel for DisabledChannel {
    async fn send(&self, _message: &OutboundMessage) -> Result<DeliveryOutcome, ChannelError> {
        let reason = if self.reason.is_empty() {
            "no channel configured".to_string()
        } else {
            self.reason.clone()
        };
        Err(ChannelError::NotConfigured(reason))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
