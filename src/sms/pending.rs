use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};

use crate::sms::SendResult;

/// Send attempts waiting for their radio outcome, keyed by message id.
///
/// A result can only be delivered for a message id registered at send time,
/// so an outcome for a job this device never dispatched goes nowhere.
#[derive(Debug, Clone, Default)]
pub struct PendingDeliveries {
    inner: Arc<Mutex<HashMap<String, oneshot::Sender<SendResult>>>>,
}

impl PendingDeliveries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a send attempt and get the handle that resolves with its outcome.
    pub async fn register(&self, message_id: &str) -> PendingConfirmation {
        let (tx, rx) = oneshot::channel();
        if self
            .inner
            .lock()
            .await
            .insert(message_id.to_string(), tx)
            .is_some()
        {
            tracing::warn!(message_id, "Replaced an existing pending send");
        }
        PendingConfirmation {
            message_id: message_id.to_string(),
            rx,
        }
    }

    /// Complete a pending send. Returns false when nothing was waiting.
    pub async fn deliver(&self, message_id: &str, result: SendResult) -> bool {
        let Some(tx) = self.inner.lock().await.remove(message_id) else {
            tracing::warn!(message_id, result = %result, "Send result for unknown message, ignoring");
            return false;
        };
        tx.send(result).is_ok()
    }

    /// Drop a registration whose send attempt never reached the radio.
    pub async fn cancel(&self, message_id: &str) {
        self.inner.lock().await.remove(message_id);
    }

    pub async fn is_pending(&self, message_id: &str) -> bool {
        self.inner.lock().await.contains_key(message_id)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

/// Outcome handle returned by a dispatch.
#[derive(Debug)]
pub struct PendingConfirmation {
    message_id: String,
    rx: oneshot::Receiver<SendResult>,
}

impl PendingConfirmation {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Wait for the radio outcome. `None` when the registration was dropped
    /// without a result.
    pub async fn outcome(self) -> Option<SendResult> {
        self.rx.await.ok()
    }
}
