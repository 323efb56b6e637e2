//! `twinai-worker` -- the TwinAI simulation engine process.
//!
//! Seeds the spare inventory, then advances machine and spare wear on a fixed
//! interval, raising threshold alerts and sending them over WhatsApp when
//! Twilio credentials are configured. Stops cleanly on Ctrl-C or SIGTERM.
//!
//! # Environment variables
//!
//! | Variable                         | Required | Default       | Description                          |
//! |----------------------------------|----------|---------------|--------------------------------------|
//! | `RUST_LOG`                       | no       | see below     | Log filter                           |
//! | `TWINAI_LOG_FORMAT`              | no       | `text`        | `json` for structured log lines      |
//! | `TWINAI_TICK_INTERVAL_SECS`      | no       | `30`          | Seconds between simulation passes    |
//! | `TWINAI_ALERT_POLICY`            | no       | `every_pass`  | Or `edge_triggered`                  |
//! | `TWINAI_SPARES_CSV`              | no       | bundled path  | Spare inventory seed file            |
//! | `TWILIO_ACCOUNT_SID`             | no       | --            | Enables WhatsApp delivery            |
//! | `TWILIO_AUTH_TOKEN`              | no       | --            | Enables WhatsApp delivery            |
//!
//! See [`EngineConfig::from_env`] and [`WhatsAppConfig::from_env`] for the
//! complete list.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twinai_db::{AssetStore, MemStore};
use twinai_events::delivery::{WhatsAppConfig, WhatsAppDelivery};
use twinai_events::{DisabledChannel, NotificationChannel};
use twinai_pipeline::import::CsvSpareSource;
use twinai_pipeline::{AssetService, EngineConfig, Scheduler};

const DEFAULT_LOG_FILTER: &str =
    "twinai_worker=info,twinai_pipeline=info,twinai_db=info,twinai_events=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = EngineConfig::from_env();
    tracing::info!(
        interval_secs = config.tick_interval.as_secs(),
        alert_policy = ?config.alert_policy,
        spares_csv = %config.spares_csv.display(),
        seeded = config.rng_seed.is_some(),
        "Starting twinai-worker",
    );

    let channel = build_channel().context("failed to build notification channel")?;
    let store: Arc<dyn AssetStore> = Arc::new(MemStore::new());
    let source = Arc::new(CsvSpareSource::new(config.spares_csv.clone()));
    let service = Arc::new(AssetService::new(store, channel, source, config));

    let spares = service.load_spares().await.context("failed to seed spares")?;
    tracing::info!(spares = spares.len(), "Spare inventory ready");

    let scheduler = Scheduler::from_service(Arc::clone(&service));
    scheduler.start().await;

    shutdown_signal().await;

    // --- Post-shutdown cleanup ---
    scheduler.shutdown().await;
    service.flush_deliveries().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

fn init_tracing() {
    let json = std::env::var("TWINAI_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// WhatsApp when Twilio credentials are present, otherwise a channel that
/// records every alert as unsent.
fn build_channel() -> anyhow::Result<Arc<dyn NotificationChannel>> {
    match WhatsAppConfig::from_env() {
        Some(config) => {
            if config.from.is_none() {
                tracing::warn!("TWILIO_WHATSAPP_FROM is not set; alert delivery will fail");
            }
            if config.default_to.is_none() {
                tracing::warn!("TWILIO_WHATSAPP_TO is not set; alerts have no recipient");
            }
            tracing::info!("WhatsApp alert delivery enabled");
            Ok(Arc::new(WhatsAppDelivery::new(config)?))
        }
        None => {
            tracing::warn!("Twilio credentials not configured; alerts will not be delivered");
            Ok(Arc::new(DisabledChannel::new(
                "TWILIO_ACCOUNT_SID or TWILIO_AUTH_TOKEN is not set",
            )))
        }
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
