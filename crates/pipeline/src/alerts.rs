//! Alert persistence and delivery.
//!
//! Threshold drafts are stored first with `sent_via_whatsapp = false`; the
//! notification is then sent on a tracked background task outside every store
//! lock, and its outcome is written back with `record_alert_delivery`. A slow
//! or failing channel therefore never delays a simulation pass.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::task::TaskTracker;
use twinai_core::alert::{Alert, AlertSubject, CreateAlert};
use twinai_core::machine::Machine;
use twinai_core::spare::CriticalSpare;
use twinai_core::thresholds::{
    evaluate_machines, evaluate_spares, AlertDraft, AlertGate, AlertNotice, AlertPolicy,
};
use twinai_core::types::EntityId;
use twinai_db::{AssetStore, StoreResult};
use twinai_events::{NotificationDispatcher, OutboundMessage};

/// What to deliver once an alert is stored.
enum Delivery {
    Notice(AlertNotice),
    Text(String),
}

pub struct AlertPipeline {
    store: Arc<dyn AssetStore>,
    dispatcher: NotificationDispatcher,
    gate: Mutex<AlertGate>,
    deliveries: TaskTracker,
}

impl AlertPipeline {
    pub fn new(
        store: Arc<dyn AssetStore>,
        dispatcher: NotificationDispatcher,
        policy: AlertPolicy,
    ) -> Self {
        Self {
            store,
            dispatcher,
            gate: Mutex::new(AlertGate::new(policy)),
            deliveries: TaskTracker::new(),
        }
    }

    pub fn policy(&self) -> AlertPolicy {
        self.gate().policy()
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    fn gate(&self) -> MutexGuard<'_, AlertGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate post-tick machines and raise whatever the gate admits.
    pub async fn raise_for_machines(&self, machines: &[Machine]) -> StoreResult<Vec<Alert>> {
        let drafts = evaluate_machines(machines, &mut self.gate());
        self.raise(drafts).await
    }

    /// Evaluate post-tick spares and raise whatever the gate admits.
    pub async fn raise_for_spares(&self, spares: &[CriticalSpare]) -> StoreResult<Vec<Alert>> {
        let drafts = evaluate_spares(spares, &mut self.gate());
        self.raise(drafts).await
    }

    /// Persist each draft, then hand its notice to the dispatcher.
    pub async fn raise(&self, drafts: Vec<AlertDraft>) -> StoreResult<Vec<Alert>> {
        let mut raised = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let alert = self.store.insert_alert(draft.alert).await?;
            tracing::info!(
                alert_id = %alert.id,
                severity = ?alert.severity,
                alert_type = ?alert.alert_type,
                "Alert raised"
            );
            self.spawn_delivery(alert.id, Delivery::Notice(draft.notice));
            raised.push(alert);
        }
        Ok(raised)
    }

    /// Persist a manually created alert. With `notify`, its message text is
    /// sent through the channel like any raised alert.
    pub async fn create_alert(&self, mut input: CreateAlert, notify: bool) -> StoreResult<Alert> {
        if notify {
            input.sent_via_whatsapp = false;
        }
        let alert = self.store.insert_alert(input).await?;
        if notify {
            self.spawn_delivery(alert.id, Delivery::Text(alert.message.clone()));
        }
        Ok(alert)
    }

    /// Clear edge-trigger state for a deleted entity.
    pub fn forget(&self, subject: &AlertSubject) {
        self.gate().forget(subject);
    }

    /// Wait until every delivery spawned so far has recorded its outcome.
    pub async fn flush_deliveries(&self) {
        self.deliveries.close();
        self.deliveries.wait().await;
        self.deliveries.reopen();
    }

    /// Deliveries still in flight.
    pub fn pending_deliveries(&self) -> usize {
        self.deliveries.len()
    }

    fn spawn_delivery(&self, alert_id: EntityId, delivery: Delivery) {
        let store = Arc::clone(&self.store);
        let dispatcher = self.dispatcher.clone();
        self.deliveries.spawn(async move {
            let sent = match &delivery {
                Delivery::Notice(notice) => dispatcher.dispatch(notice).await,
                Delivery::Text(text) => {
                    let label = alert_id.to_string();
                    dispatcher
                        .dispatch_message(&label, &OutboundMessage::body(text.clone()))
                        .await
                }
            };
            match store.record_alert_delivery(alert_id, sent).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(%alert_id, "Alert vanished before delivery was recorded"),
                Err(e) => tracing::error!(%alert_id, error = %e, "Failed to record alert delivery"),
            }
        });
    }
}
