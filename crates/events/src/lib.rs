//! Outbound notification delivery for TwinAI alerts.
//!
//! - [`channel`]: the [`NotificationChannel`] seam and its message types.
//! - [`delivery`]: concrete channels (WhatsApp via the Twilio REST API).
//! - [`dispatcher`]: turns an alert notice into exactly one send attempt.

pub mod channel;
pub mod delivery;
pub mod dispatcher;

pub use channel::{
    ChannelError, DeliveryOutcome, DisabledChannel, MessageContent, NotificationChannel,
    OutboundMessage,
};
pub use dispatcher::NotificationDispatcher;
