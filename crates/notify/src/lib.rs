//! `preorder-notify` — pre-order purchase notifications.
//!
//! Detection and composition are synchronous; delivery is queued and
//! retried on a background worker so order-event handlers never wait on a
//! mail transport.

pub mod dispatch;
pub mod mailer;
pub mod message;
pub mod queue;
pub mod worker;

pub use dispatch::notify_for_event;
pub use mailer::{MailError, Mailer, OutboundEmail, RecordingMailer};
pub use queue::{
    Backoff, DeadLetter, DeliveryStatus, InMemoryNotificationQueue, Notification, NotificationId,
    NotificationQueue, QueueError, RetryPolicy,
};
pub use worker::{DispatchConfig, DispatchCounters, DispatchHandle, DispatchOutcome, Dispatcher};
