//! Background dispatch worker.
//!
//! Polls the queue for due notifications and hands them to the mailer,
//! recording retries and dead-letters. One worker thread is enough for this
//! traffic; the queue's claim step keeps extra workers safe anyway.

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::mailer::Mailer;
use crate::queue::{DeliveryStatus, NotificationQueue};

/// Dispatch worker configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How often to poll for due notifications.
    pub poll_interval: Duration,
    /// Thread/log name.
    pub name: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            name: "notification-dispatch".to_string(),
        }
    }
}

/// What happened to one claimed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Retried,
    DeadLettered,
}

/// Worker counters.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DispatchCounters {
    pub processed: u64,
    pub sent: u64,
    pub retried: u64,
    pub dead_lettered: u64,
}

/// Handle to a running dispatch worker.
#[derive(Debug)]
pub struct DispatchHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    counters: Arc<Mutex<DispatchCounters>>,
}

impl DispatchHandle {
    /// Request graceful shutdown and wait for the thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    pub fn counters(&self) -> DispatchCounters {
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Queue-to-mailer pump.
pub struct Dispatcher<Q, M> {
    queue: Q,
    mailer: M,
}

impl<Q, M> Dispatcher<Q, M>
where
    Q: NotificationQueue,
    M: Mailer,
{
    pub fn new(queue: Q, mailer: M) -> Self {
        Self { queue, mailer }
    }

    /// Claim and dispatch at most one due notification.
    ///
    /// Synchronous building block: the worker loop calls this with the wall
    /// clock, tests call it with a pinned `now`.
    pub fn run_once(&self, now: DateTime<Utc>) -> Option<DispatchOutcome> {
        let mut notification = match self.queue.claim_due(now) {
            Ok(Some(n)) => n,
            Ok(None) => return None,
            Err(e) => {
                error!(error = %e, "failed to claim notification");
                return None;
            }
        };

        match self.mailer.send(&notification.email) {
            Ok(()) => {
                notification.mark_sent(now);
                if let Err(e) = self.queue.update(&notification) {
                    error!(notification_id = %notification.id, error = %e, "failed to persist sent status");
                }
                debug!(
                    notification_id = %notification.id,
                    order_id = %notification.order_id,
                    to = %notification.email.to,
                    "notification sent"
                );
                Some(DispatchOutcome::Sent)
            }
            Err(mail_error) => {
                notification.mark_failed(mail_error.to_string(), now);
                if let Err(e) = self.queue.update(&notification) {
                    error!(notification_id = %notification.id, error = %e, "failed to persist failure status");
                }

                if let DeliveryStatus::DeadLettered { ref error, attempts } = notification.status {
                    warn!(
                        notification_id = %notification.id,
                        order_id = %notification.order_id,
                        attempts,
                        error = %error,
                        "notification dead-lettered"
                    );
                    let reason = error.clone();
                    if let Err(e) = self.queue.dead_letter(notification, reason) {
                        error!(error = %e, "failed to record dead letter");
                    }
                    Some(DispatchOutcome::DeadLettered)
                } else {
                    debug!(
                        notification_id = %notification.id,
                        attempt = notification.attempt,
                        error = %mail_error,
                        "send failed, retry scheduled"
                    );
                    Some(DispatchOutcome::Retried)
                }
            }
        }
    }

    /// Spawn the worker on a named background thread.
    pub fn spawn(self, config: DispatchConfig) -> DispatchHandle
    where
        Q: 'static,
        M: 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let counters = Arc::new(Mutex::new(DispatchCounters::default()));
        let counters_clone = counters.clone();

        let name = config.name.clone();
        let join = thread::Builder::new()
            .name(name)
            .spawn(move || dispatch_loop(self, config, shutdown_rx, counters_clone))
            .expect("failed to spawn notification dispatch thread");

        DispatchHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            counters,
        }
    }
}

fn dispatch_loop<Q, M>(
    dispatcher: Dispatcher<Q, M>,
    config: DispatchConfig,
    shutdown_rx: mpsc::Receiver<()>,
    counters: Arc<Mutex<DispatchCounters>>,
) where
    Q: NotificationQueue,
    M: Mailer,
{
    info!(worker = %config.name, "notification dispatch worker started");

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match dispatcher.run_once(Utc::now()) {
            Some(outcome) => {
                let mut c = counters.lock().unwrap_or_else(|e| e.into_inner());
                c.processed += 1;
                match outcome {
                    DispatchOutcome::Sent => c.sent += 1,
                    DispatchOutcome::Retried => c.retried += 1,
                    DispatchOutcome::DeadLettered => c.dead_lettered += 1,
                }
            }
            None => thread::sleep(config.poll_interval),
        }
    }

    info!(worker = %config.name, "notification dispatch worker stopped");
}
