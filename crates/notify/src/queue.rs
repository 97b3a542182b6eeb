//! Notification queue with retry, backoff, and dead-letter handling.
//!
//! Order-event handlers must never block on mail transport, so they enqueue
//! here and return. A dispatch worker claims due notifications and sends
//! them; a failed send is rescheduled with backoff until the retry budget
//! runs out, then parked on the dead-letter list for inspection. Nothing on
//! this path ever surfaces to the buyer.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use preorder_core::OrderId;
use preorder_sales::LifecycleEvent;

use crate::mailer::OutboundEmail;

/// Unique notification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery status of one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Queued, waiting for the worker.
    Pending,
    /// Claimed by the worker, send in flight.
    Sending,
    /// Delivered to the transport.
    Sent,
    /// Send failed, scheduled for another attempt.
    Failed { error: String, attempt: u32 },
    /// Retry budget exhausted; parked for inspection.
    DeadLettered { error: String, attempts: u32 },
}

impl DeliveryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::DeadLettered { .. })
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Backoff shape between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay every time.
    Fixed,
    /// `base * 2^(attempt-1)`, capped at the max delay.
    Exponential,
}

/// Retry policy for mail dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed (1 = no retries after the first send).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // Mail transports fail in minutes-scale outages; back off
        // accordingly rather than hammering at millisecond intervals.
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(15 * 60),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// One attempt, no retries.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            backoff: Backoff::Fixed,
        }
    }

    /// Delay before the attempt *after* `attempt` (1-indexed).
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;

        let delay_ms = match self.backoff {
            Backoff::Fixed => base_ms,
            Backoff::Exponential => {
                let shift = attempt.saturating_sub(1).min(32);
                base_ms.saturating_mul(1u64 << shift).min(max_ms)
            }
        };

        Duration::from_millis(delay_ms)
    }

    pub fn allows_another_attempt(&self, attempts_so_far: u32) -> bool {
        attempts_so_far < self.max_attempts
    }
}

/// One queued notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub order_id: OrderId,
    pub event: LifecycleEvent,
    pub email: OutboundEmail,
    pub status: DeliveryStatus,
    pub retry_policy: RetryPolicy,
    /// Attempts started so far.
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Earliest instant the next attempt may run; `None` means immediately.
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        order_id: OrderId,
        event: LifecycleEvent,
        email: OutboundEmail,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            order_id,
            event,
            email,
            status: DeliveryStatus::Pending,
            retry_policy: RetryPolicy::default(),
            attempt: 0,
            created_at: now,
            updated_at: now,
            next_attempt_at: None,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Ready for a (re)send at `now`?
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let claimable = matches!(self.status, DeliveryStatus::Pending)
            || self.status.is_retriable();
        claimable
            && match self.next_attempt_at {
                Some(at) => now >= at,
                None => true,
            }
    }

    pub fn mark_sending(&mut self, now: DateTime<Utc>) {
        self.status = DeliveryStatus::Sending;
        self.attempt += 1;
        self.updated_at = now;
    }

    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        self.status = DeliveryStatus::Sent;
        self.updated_at = now;
    }

    /// Record a failed attempt: reschedule with backoff while the budget
    /// lasts, dead-letter once it is spent.
    pub fn mark_failed(&mut self, error: String, now: DateTime<Utc>) {
        self.updated_at = now;
        if self.retry_policy.allows_another_attempt(self.attempt) {
            let delay = self.retry_policy.delay_after_attempt(self.attempt);
            self.next_attempt_at =
                Some(now + chrono::Duration::from_std(delay).unwrap_or_default());
            self.status = DeliveryStatus::Failed {
                error,
                attempt: self.attempt,
            };
        } else {
            self.status = DeliveryStatus::DeadLettered {
                error,
                attempts: self.attempt,
            };
        }
    }
}

/// Entry on the dead-letter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub notification: Notification,
    pub dead_lettered_at: DateTime<Utc>,
    pub reason: String,
}

/// Queue storage error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("notification not found: {0}")]
    NotFound(NotificationId),
    #[error("notification already queued: {0}")]
    AlreadyExists(NotificationId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Notification queue abstraction.
///
/// `claim_due` atomically moves one due notification into `Sending` so two
/// workers never grab the same entry.
pub trait NotificationQueue: Send + Sync {
    fn enqueue(&self, notification: Notification) -> Result<NotificationId, QueueError>;

    fn get(&self, id: NotificationId) -> Result<Option<Notification>, QueueError>;

    fn update(&self, notification: &Notification) -> Result<(), QueueError>;

    /// Claim the oldest due notification, if any.
    fn claim_due(&self, now: DateTime<Utc>) -> Result<Option<Notification>, QueueError>;

    fn dead_letter(&self, notification: Notification, reason: String) -> Result<(), QueueError>;

    fn dead_letters(&self) -> Result<Vec<DeadLetter>, QueueError>;

    /// Notifications still awaiting delivery (pending or scheduled retry).
    fn backlog(&self) -> Result<usize, QueueError>;
}

impl<Q> NotificationQueue for Arc<Q>
where
    Q: NotificationQueue + ?Sized,
{
    fn enqueue(&self, notification: Notification) -> Result<NotificationId, QueueError> {
        (**self).enqueue(notification)
    }

    fn get(&self, id: NotificationId) -> Result<Option<Notification>, QueueError> {
        (**self).get(id)
    }

    fn update(&self, notification: &Notification) -> Result<(), QueueError> {
        (**self).update(notification)
    }

    fn claim_due(&self, now: DateTime<Utc>) -> Result<Option<Notification>, QueueError> {
        (**self).claim_due(now)
    }

    fn dead_letter(&self, notification: Notification, reason: String) -> Result<(), QueueError> {
        (**self).dead_letter(notification, reason)
    }

    fn dead_letters(&self) -> Result<Vec<DeadLetter>, QueueError> {
        (**self).dead_letters()
    }

    fn backlog(&self) -> Result<usize, QueueError> {
        (**self).backlog()
    }
}

/// In-memory queue for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryNotificationQueue {
    entries: RwLock<HashMap<NotificationId, Notification>>,
    dead: RwLock<Vec<DeadLetter>>,
}

impl InMemoryNotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl NotificationQueue for InMemoryNotificationQueue {
    fn enqueue(&self, notification: Notification) -> Result<NotificationId, QueueError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(&notification.id) {
            return Err(QueueError::AlreadyExists(notification.id));
        }
        let id = notification.id;
        entries.insert(id, notification);
        Ok(id)
    }

    fn get(&self, id: NotificationId) -> Result<Option<Notification>, QueueError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(&id).cloned())
    }

    fn update(&self, notification: &Notification) -> Result<(), QueueError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if !entries.contains_key(&notification.id) {
            return Err(QueueError::NotFound(notification.id));
        }
        entries.insert(notification.id, notification.clone());
        Ok(())
    }

    fn claim_due(&self, now: DateTime<Utc>) -> Result<Option<Notification>, QueueError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let due = entries
            .values()
            .filter(|n| n.is_due(now))
            .min_by_key(|n| n.created_at)
            .map(|n| n.id);

        Ok(due.map(|id| {
            let entry = entries.get_mut(&id).expect("id taken from this map");
            entry.mark_sending(now);
            entry.clone()
        }))
    }

    fn dead_letter(&self, notification: Notification, reason: String) -> Result<(), QueueError> {
        let mut dead = self.dead.write().unwrap_or_else(|e| e.into_inner());
        dead.push(DeadLetter {
            notification,
            dead_lettered_at: Utc::now(),
            reason,
        });
        Ok(())
    }

    fn dead_letters(&self) -> Result<Vec<DeadLetter>, QueueError> {
        let dead = self.dead.read().unwrap_or_else(|e| e.into_inner());
        Ok(dead.clone())
    }

    fn backlog(&self) -> Result<usize, QueueError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .values()
            .filter(|n| {
                matches!(n.status, DeliveryStatus::Pending) || n.status.is_retriable()
            })
            .count())
    }
}
