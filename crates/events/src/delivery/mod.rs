//! Concrete notification channels.

pub mod whatsapp;

pub use whatsapp::{WhatsAppConfig, WhatsAppDelivery};
