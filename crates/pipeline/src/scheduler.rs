//! Periodic simulation scheduler.
//!
//! Runs [`AssetService::run_cycle`] on a fixed interval. `start` performs one
//! pass inline and then spawns the loop; `stop` cancels the timer. A pass
//! already in progress is never aborted, and a failing pass is logged and
//! the loop keeps going.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::service::AssetService;

struct LoopHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

pub struct Scheduler {
    service: Arc<AssetService>,
    period: Duration,
    running: AtomicBool,
    handle: Mutex<Option<LoopHandle>>,
}

impl Scheduler {
    pub fn new(service: Arc<AssetService>, period: Duration) -> Self {
        Self {
            service,
            period,
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Use the service's configured tick interval.
    pub fn from_service(service: Arc<AssetService>) -> Self {
        let period = service.config().tick_interval;
        Self::new(service, period)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one pass now, then keep running on the interval. No-op if already
    /// running.
    pub async fn start(&self) {
        let Some(cancel) = self.register() else {
            tracing::debug!("Simulation scheduler already running");
            return;
        };

        tracing::info!(
            interval_secs = self.period.as_secs(),
            "Simulation scheduler started"
        );
        run_pass(&self.service).await;

        let service = Arc::clone(&self.service);
        let task = tokio::spawn(run_loop(service, self.period, cancel.clone()));
        self.attach(&cancel, task);
    }

    /// Cancel the timer. Safe to call when not running.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.cancel_handle();
        tracing::info!("Simulation scheduler stopped");
    }

    /// Stop and wait for the loop task to finish its current pass.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let Some(handle) = self.cancel_handle() else {
            return;
        };

        if let Some(task) = handle.task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Simulation loop task failed");
            }
        }
        tracing::info!("Simulation scheduler shut down");
    }

    /// Mark the scheduler running and register a fresh token, before the
    /// first pass so a concurrent stop() can cancel it. `None` if already
    /// running.
    fn register(&self) -> Option<CancellationToken> {
        if self.running.swap(true, Ordering::SeqCst) {
            return None;
        }
        let cancel = CancellationToken::new();
        *self.lock_handle() = Some(LoopHandle {
            cancel: cancel.clone(),
            task: None,
        });
        Some(cancel)
    }

    /// Attach the spawned loop to the handle `cancel` was registered with.
    /// A token cancelled in the meantime means stop() ran and the slot may
    /// belong to a newer start; the loop then exits on its own.
    fn attach(&self, cancel: &CancellationToken, task: JoinHandle<()>) {
        let mut guard = self.lock_handle();
        match guard.as_mut() {
            Some(handle) if !cancel.is_cancelled() => handle.task = Some(task),
            _ => drop(task),
        }
    }

    /// Take the current handle and cancel it while the lock is held.
    fn cancel_handle(&self) -> Option<LoopHandle> {
        let mut guard = self.lock_handle();
        let handle = guard.take()?;
        handle.cancel.cancel();
        Some(handle)
    }

    fn lock_handle(&self) -> MutexGuard<'_, Option<LoopHandle>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_pass(service: &AssetService) {
    if let Err(e) = service.run_cycle().await {
        tracing::error!(error = %e, "Simulation cycle failed");
    }
}

async fn run_loop(service: Arc<AssetService>, period: Duration, cancel: CancellationToken) {
    // The first pass already ran inline in start().
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Simulation loop exiting");
                break;
            }
            _ = ticker.tick() => {
                run_pass(&service).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use twinai_db::MemStore;
    use twinai_events::DisabledChannel;

    use super::*;
    use crate::config::EngineConfig;
    use crate::import::NoSpareSource;

    fn scheduler() -> Scheduler {
        let service = AssetService::new(
            Arc::new(MemStore::new()),
            Arc::new(DisabledChannel::new("test")),
            Arc::new(NoSpareSource),
            EngineConfig::default(),
        );
        Scheduler::new(Arc::new(service), Duration::from_secs(3_600))
    }

    fn spawn_loop(scheduler: &Scheduler, cancel: &CancellationToken) -> JoinHandle<()> {
        tokio::spawn(run_loop(
            Arc::clone(&scheduler.service),
            scheduler.period,
            cancel.clone(),
        ))
    }

    fn has_task(scheduler: &Scheduler) -> bool {
        scheduler
            .lock_handle()
            .as_ref()
            .is_some_and(|h| h.task.is_some())
    }

    /// A start that was stopped during its first pass must not attach its
    /// loop to the run started after it.
    #[tokio::test]
    async fn stopped_start_leaves_newer_run_alone() {
        let scheduler = scheduler();
        let first = scheduler.register().unwrap();
        scheduler.stop();
        let second = scheduler.register().unwrap();

        let stale = spawn_loop(&scheduler, &first);
        scheduler.attach(&first, stale);
        assert!(!has_task(&scheduler));
        assert!(!second.is_cancelled());

        let current = spawn_loop(&scheduler, &second);
        scheduler.attach(&second, current);
        assert!(has_task(&scheduler));

        scheduler.shutdown().await;
        assert!(second.is_cancelled());
        assert!(!scheduler.is_running());
    }

    /// A second register while running is refused.
    #[tokio::test]
    async fn register_is_exclusive() {
        let scheduler = scheduler();
        assert!(scheduler.register().is_some());
        assert!(scheduler.register().is_none());
        scheduler.stop();
        assert!(scheduler.lock_handle().is_none());
    }
}
