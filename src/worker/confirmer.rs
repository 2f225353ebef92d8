use std::sync::Arc;

use chrono::Utc;

use crate::events::{EventBus, VerifierEvent};
use crate::pool::{job_path, JobUpdate};
use crate::sms::SendResult;
use crate::store::JobStore;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// The shared job is now marked sent.
    Confirmed,
    /// The radio failed; the job stays assigned.
    NotDelivered(SendResult),
    /// The store rejected the update.
    StoreError(String),
}

/// Finalises a dispatched job once the radio reports its outcome.
///
/// Only the assignee writes the sent state, so a plain field update is
/// enough; no transaction is needed. Failures are logged and not retried.
pub struct DeliveryConfirmer {
    store: Arc<dyn JobStore>,
    network_id: String,
    events: EventBus,
}

impl DeliveryConfirmer {
    pub fn new(store: Arc<dyn JobStore>, network_id: impl Into<String>, events: EventBus) -> Self {
        Self {
            store,
            network_id: network_id.into(),
            events,
        }
    }

    pub async fn confirm(&self, message_id: &str, result: SendResult) -> ConfirmOutcome {
        let outcome = if result.is_success() {
            let path = job_path(&self.network_id, message_id);
            match self.store.update(&path, &JobUpdate::sent_at(Utc::now())).await {
                Ok(()) => {
                    tracing::info!(message_id, "Job marked as sent");
                    ConfirmOutcome::Confirmed
                }
                Err(e) => {
                    tracing::warn!(message_id, error = %e, "Failed to mark job as sent");
                    ConfirmOutcome::StoreError(e.to_string())
                }
            }
        } else {
            // TODO: release the assignment so another verifier can pick the job up
            tracing::warn!(message_id, result = %result, "SMS not delivered, job stays assigned");
            ConfirmOutcome::NotDelivered(result)
        };

        self.events.publish(VerifierEvent::DeliveryResult {
            message_id: message_id.to_string(),
            result,
        });
        outcome
    }
}
