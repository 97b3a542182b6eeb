//! Mail transport collaborator.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A composed email, ready for the host's transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail dispatch failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
}

/// Mail sender collaborator. Implementations wrap whatever transport the
/// host uses (SMTP, platform mail API, ...). Dispatch is best-effort from
/// the buyer's point of view; retries live in the queue, not here.
pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

impl<M> Mailer for Arc<M>
where
    M: Mailer + ?Sized,
{
    fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        (**self).send(email)
    }
}

/// Recording mailer for tests/dev: captures every send, optionally failing
/// the first N attempts to exercise retry paths.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    failures_remaining: Mutex<u32>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose first `times` sends fail with a transport error.
    pub fn failing_first(times: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_remaining: Mutex::new(times),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let mut failures = self
            .failures_remaining
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if *failures > 0 {
            *failures -= 1;
            return Err(MailError::Transport("scripted failure".to_string()));
        }
        drop(failures);

        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(email.clone());
        Ok(())
    }
}
