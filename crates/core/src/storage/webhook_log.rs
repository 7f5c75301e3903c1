use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::webhook::WebhookMessage;

pub const LOG_CAPACITY: usize = 50;

/// Process-wide webhook log. Lives for the process lifetime, starts empty,
/// holds at most [`LOG_CAPACITY`] messages, newest first.
#[derive(Debug, Default)]
pub struct WebhookLog {
    messages: Mutex<Vec<WebhookMessage>>,
}

impl WebhookLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the payload and prepend it, dropping the oldest entries beyond
    /// capacity. Prepend and truncate happen under one lock acquisition.
    pub fn ingest(&self, payload: Value) -> WebhookMessage {
        let message = WebhookMessage {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            payload,
        };

        let mut messages = self.lock();
        messages.insert(0, message.clone());
        messages.truncate(LOG_CAPACITY);
        tracing::debug!(id = %message.id, stored = messages.len(), "webhook message stored");

        message
    }

    /// Snapshot of the log, newest first. No side effects.
    pub fn list(&self) -> Vec<WebhookMessage> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WebhookMessage>> {
        // The log is best-effort; recover the guard if a writer panicked.
        match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
