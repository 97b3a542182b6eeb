//! Periodic sweep trigger.
//!
//! Hosts with their own task scheduler call [`run_sweep`](crate::sweep::run_sweep)
//! directly; this worker is for embeddings without one. Daily cadence by
//! default, matching how shops schedule availability flips.

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use preorder_core::MetadataStore;

use crate::sweep::{run_sweep, SweepReport};

/// Sweep worker configuration.
#[derive(Debug, Clone)]
pub struct SweepSchedule {
    /// Time between passes.
    pub interval: Duration,
    /// Run one pass immediately on spawn instead of waiting a full interval.
    pub run_at_start: bool,
    /// Thread/log name.
    pub name: String,
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            run_at_start: true,
            name: "preorder-sweep".to_string(),
        }
    }
}

impl SweepSchedule {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }
}

/// Handle to a running sweep worker.
#[derive(Debug)]
pub struct SweepWorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    last_report: Arc<Mutex<Option<SweepReport>>>,
}

impl SweepWorkerHandle {
    /// Request graceful shutdown and wait for the thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    /// The most recent pass's report, if any pass has run yet.
    pub fn last_report(&self) -> Option<SweepReport> {
        *self.last_report.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Spawn the sweep worker on a named background thread.
pub fn spawn_sweep_worker<S>(store: S, schedule: SweepSchedule) -> SweepWorkerHandle
where
    S: MetadataStore + 'static,
{
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    let last_report = Arc::new(Mutex::new(None));
    let last_report_clone = last_report.clone();

    let name = schedule.name.clone();
    let join = thread::Builder::new()
        .name(name)
        .spawn(move || sweep_loop(store, schedule, shutdown_rx, last_report_clone))
        .expect("failed to spawn sweep worker thread");

    SweepWorkerHandle {
        shutdown: shutdown_tx,
        join: Some(join),
        last_report,
    }
}

fn sweep_loop<S: MetadataStore>(
    store: S,
    schedule: SweepSchedule,
    shutdown_rx: mpsc::Receiver<()>,
    last_report: Arc<Mutex<Option<SweepReport>>>,
) {
    info!(worker = %schedule.name, interval_secs = schedule.interval.as_secs(), "sweep worker started");

    if schedule.run_at_start {
        let report = run_sweep(&store, Utc::now());
        *last_report.lock().unwrap_or_else(|e| e.into_inner()) = Some(report);
    }

    loop {
        match shutdown_rx.recv_timeout(schedule.interval) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let report = run_sweep(&store, Utc::now());
                *last_report.lock().unwrap_or_else(|e| e.into_inner()) = Some(report);
            }
        }
    }

    info!(worker = %schedule.name, "sweep worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use preorder_catalog::meta::{self, keys};
    use preorder_core::{InMemoryMetadataStore, ProductId};

    #[test]
    fn run_at_start_releases_due_products_without_waiting() {
        let store = InMemoryMetadataStore::arc();
        let id = ProductId::new();
        store.set(id, keys::IS_PRE_ORDER, "yes");
        store.set(id, keys::DATE, "2020-01-01");

        let handle = spawn_sweep_worker(store.clone(), SweepSchedule::every(Duration::from_secs(3600)));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while handle.last_report().is_none() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        handle.shutdown();
        assert!(!meta::is_preorder_flagged(&store, id));
    }

    #[test]
    fn shutdown_interrupts_the_interval_wait() {
        let store = InMemoryMetadataStore::arc();
        let handle = spawn_sweep_worker(
            store,
            SweepSchedule {
                interval: Duration::from_secs(24 * 60 * 60),
                run_at_start: false,
                ..Default::default()
            },
        );

        // Returns promptly despite the day-long interval.
        handle.shutdown();
    }
}
