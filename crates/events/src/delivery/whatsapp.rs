//! WhatsApp delivery via the Twilio Messages REST API.
//!
//! [`WhatsAppDelivery`] posts a form-encoded message to
//! `{api_base}/2010-04-01/Accounts/{sid}/Messages.json` with HTTP basic auth.
//! Configuration is loaded from environment variables; if the account SID or
//! auth token is missing, [`WhatsAppConfig::from_env`] returns `None` and the
//! caller should fall back to a [`DisabledChannel`](crate::DisabledChannel).
//!
//! Each call makes exactly one attempt. Retrying is the caller's decision.

use std::time::Duration;

use async_trait::async_trait;

use crate::channel::{
    ChannelError, DeliveryOutcome, MessageContent, NotificationChannel, OutboundMessage,
};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default Twilio API base when `TWILIO_API_BASE` is not set.
const DEFAULT_API_BASE: &str = "https://api.twilio.com";

// ---------------------------------------------------------------------------
// WhatsAppConfig
// ---------------------------------------------------------------------------

/// Credentials and addressing for the Twilio WhatsApp sender.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, without the `whatsapp:` prefix.
    pub from: Option<String>,
    /// Default recipient, without the `whatsapp:` prefix.
    pub default_to: Option<String>,
    pub api_base: String,
}

impl WhatsAppConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `TWILIO_ACCOUNT_SID` or `TWILIO_AUTH_TOKEN` is not
    /// set, signalling that WhatsApp delivery is not configured.
    ///
    /// | Variable               | Required | Default                  |
    /// |------------------------|----------|--------------------------|
    /// | `TWILIO_ACCOUNT_SID`   | yes      | --                       |
    /// | `TWILIO_AUTH_TOKEN`    | yes      | --                       |
    /// | `TWILIO_WHATSAPP_FROM` | no       | `TWILIO_PHONE_NUMBER`    |
    /// | `TWILIO_WHATSAPP_TO`   | no       | --                       |
    /// | `TWILIO_API_BASE`      | no       | `https://api.twilio.com` |
    pub fn from_env() -> Option<Self> {
        let account_sid = non_empty_var("TWILIO_ACCOUNT_SID")?;
        let auth_token = non_empty_var("TWILIO_AUTH_TOKEN")?;
        Some(Self {
            account_sid,
            auth_token,
            from: non_empty_var("TWILIO_WHATSAPP_FROM")
                .or_else(|| non_empty_var("TWILIO_PHONE_NUMBER")),
            default_to: non_empty_var("TWILIO_WHATSAPP_TO"),
            api_base: non_empty_var("TWILIO_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    /// The Messages resource URL for this account.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Build the form fields for one message.
///
/// A template with no variables omits `ContentVariables` entirely.
pub fn form_params(
    config: &WhatsAppConfig,
    message: &OutboundMessage,
) -> Result<Vec<(&'static str, String)>, ChannelError> {
    let from = config.from.as_deref().ok_or_else(|| {
        ChannelError::NotConfigured(
            "TWILIO_WHATSAPP_FROM (or TWILIO_PHONE_NUMBER) is not set".to_string(),
        )
    })?;
    let to = message
        .to
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(config.default_to.as_deref())
        .ok_or(ChannelError::MissingRecipient)?;
    if message.is_empty() {
        return Err(ChannelError::EmptyMessage);
    }

    let mut params = vec![("To", format!("whatsapp:{to}")), ("From", format!("whatsapp:{from}"))];
    match &message.content {
        MessageContent::Body(text) => params.push(("Body", text.clone())),
        MessageContent::Template {
            content_sid,
            variables,
        } => {
            params.push(("ContentSid", content_sid.clone()));
            if !variables.is_empty() {
                // A BTreeMap of JSON values always serializes.
                let encoded = serde_json::to_string(variables).unwrap_or_default();
                params.push(("ContentVariables", encoded));
            }
        }
    }
    Ok(params)
}

// ---------------------------------------------------------------------------
// WhatsAppDelivery
// ---------------------------------------------------------------------------

/// Delivers messages to WhatsApp through Twilio.
pub struct WhatsAppDelivery {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppDelivery {
    /// Create a delivery service with a pre-configured HTTP client.
    pub fn new(config: WhatsAppConfig) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppDelivery {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryOutcome, ChannelError> {
        let params = form_params(&self.config, message)?;

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await.unwrap_or_default();
        let outcome = DeliveryOutcome {
            ok: status.is_success(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            response_text,
        };

        if !outcome.ok {
            tracing::warn!(
                status = outcome.status,
                status_text = %outcome.status_text,
                response = %outcome.response_text,
                "Twilio WhatsApp send failed"
            );
        }
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
