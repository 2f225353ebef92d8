use std::sync::Arc;

use crate::events::{EventBus, VerifierEvent};
use crate::local::{LogEntry, SmsLogBook};
use crate::sms::{PendingConfirmation, PendingDeliveries, SmsSender};

/// Result of a dispatch attempt.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The radio accepted the message; the outcome arrives through the handle.
    Pending(PendingConfirmation),
    /// A required field was missing.
    Skipped,
    /// The radio refused the message outright.
    Failed(String),
}

/// Sends claimed jobs and records each attempt in the local log.
///
/// The log entry is written when the radio accepts the message, not when
/// delivery is confirmed. A failed attempt leaves the job assigned remotely.
pub struct Dispatcher {
    sender: Arc<dyn SmsSender>,
    deliveries: PendingDeliveries,
    log_book: Arc<SmsLogBook>,
    events: EventBus,
}

impl Dispatcher {
    pub fn new(
        sender: Arc<dyn SmsSender>,
        deliveries: PendingDeliveries,
        log_book: Arc<SmsLogBook>,
        events: EventBus,
    ) -> Self {
        Self {
            sender,
            deliveries,
            log_book,
            events,
        }
    }

    pub async fn dispatch(
        &self,
        phone_number: Option<&str>,
        body: Option<&str>,
        message_id: Option<&str>,
    ) -> DispatchOutcome {
        let (Some(phone_number), Some(body), Some(message_id)) = (phone_number, body, message_id)
        else {
            tracing::warn!(?message_id, "Dispatch called with a missing field, skipping");
            return DispatchOutcome::Skipped;
        };

        tracing::info!(message_id, phone_number, "Sending SMS");

        let confirmation = self.deliveries.register(message_id).await;
        if let Err(e) = self.sender.send(phone_number, body, message_id).await {
            tracing::error!(message_id, error = %e, "Error sending SMS");
            self.deliveries.cancel(message_id).await;
            return DispatchOutcome::Failed(e.to_string());
        }

        match self
            .log_book
            .append(LogEntry::sent_now(phone_number, message_id))
            .await
        {
            Ok(logs) => {
                tracing::debug!(message_id, total = logs.len(), "Recorded SMS log entry");
                self.events
                    .publish(VerifierEvent::SmsLogNotification { logs });
            }
            Err(e) => {
                tracing::warn!(message_id, error = %e, "Failed to record SMS log entry");
            }
        }

        DispatchOutcome::Pending(confirmation)
    }
}
